//! # score-core
//!
//! Pure logic for scorecast (no I/O, instant tests).
//!
//! This crate owns the canonical state tree and the seam through which all
//! domain semantics enter:
//! - [`Store`] holds the one state tree and applies actions to it
//! - [`Reducer`] is the external collaborator that interprets actions
//! - [`ContestReducer`] / [`ContestConfig`] are the reference reducer and
//!   bootstrap source for a two-sided robot contest scoreboard
//!
//! ## Design Philosophy
//!
//! Nothing here touches the network or the disk. The relay decides *when*
//! actions are applied and who hears about it; this crate only decides *what*
//! applying them means. An action the reducer does not recognize leaves the
//! state untouched.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contest;
pub mod reducer;
pub mod store;

pub use contest::{
    connected_devices, ContestAction, ContestConfig, ContestReducer, TaskObject,
    REMOVE_DEVICE_ACTION,
};
pub use reducer::Reducer;
pub use store::Store;
