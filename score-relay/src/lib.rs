//! # score-relay
//!
//! Live-state relay server for scorecast.
//!
//! This crate implements a relay server that:
//! - Accepts WebSocket connections from scoring panels and display boards
//! - Keeps one canonical store, mutated only through reducer actions
//! - Replicates every accepted dispatch to all sessions, in apply order
//! - Removes closed sessions from the shared roster
//! - Saves the store to disk when a client asks
//!
//! ## Architecture
//!
//! ```text
//! Panel A ──┐                      ┌── Display B
//!           │   WebSocket (JSON)   │
//!           ├─────────────────────►│
//!           │                      │
//!       ┌───┴──────────────────────┴───┐
//!       │         score-relay          │
//!       │  ┌────────────────────────┐  │
//!       │  │  Mutex<Store> + queues │  │
//!       │  └────────────────────────┘  │
//!       │  ┌────────────────────────┐  │
//!       │  │  JSON snapshot (save)  │  │
//!       │  └────────────────────────┘  │
//!       └──────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! Text frames on `/ws`:
//! - open → `welcome {sid, time, state, version}`
//! - `dispatch` / `dispatch_all` → applied, then echoed verbatim to everyone
//! - `save_store` → `save_store_result {ok, time, error?}` to the requester
//! - close → `[removal action]` to everyone left

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod persistence;
pub mod protocol;
pub mod reconciler;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod snapshot;

pub use config::Config;
pub use error::{RelayError, Result};
pub use server::SyncRelay;
