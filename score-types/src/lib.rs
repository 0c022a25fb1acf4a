//! # score-types
//!
//! Wire format types for the scorecast live-state sync protocol.
//!
//! This crate provides the foundational types shared by the relay and its
//! clients:
//! - [`SessionId`] - Server-assigned connection identity
//! - [`Action`] - Opaque `{type, payload}` mutation request
//! - [`ClientMessage`] - Messages a client sends (dispatch, save_store)
//! - [`ServerMessage`] / [`ServerFrame`] - Messages the relay sends
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;

pub use error::WireError;
pub use ids::SessionId;
pub use messages::{
    encode_action_batch, Action, ClientMessage, SaveStoreResult, ServerFrame, ServerMessage,
    StoreState, Welcome,
};
