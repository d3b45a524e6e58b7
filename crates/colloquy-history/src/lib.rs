//! Colloquy History - Replicated conversation state
//!
//! Every participant of a session keeps the same per-actor conversation
//! logs and event queues by applying the same replicated commands in the
//! same order. This crate provides:
//!
//! - [`ConversationLog`]: bounded, role-alternating history of one actor
//! - [`EventQueue`]: events waiting to be shown, unique by id
//! - [`ReplicatedHistoryStore`]: the per-actor state plus the spoken and
//!   ignored records, with mutations routed through a
//!   [`ReplicationGateway`](colloquy_netcode::ReplicationGateway)
//!
//! Responder lines carry the generated events as a JSON array; followers
//! merge them into their queues when the line is applied, the authority
//! already has them.

mod config;
mod error;
mod log;
pub mod payload;
mod queue;
mod store;
pub mod text;

pub use config::HistoryConfig;
pub use error::{Error, ErrorOnce, Result};
pub use log::{ConversationLog, HistoryEntry};
pub use queue::EventQueue;
pub use store::ReplicatedHistoryStore;
