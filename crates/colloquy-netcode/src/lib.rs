//! Colloquy Netcode - Command replication for lockstep sessions
//!
//! This crate provides the plumbing between local state and the wire:
//!
//! - **Authority**: which participant generates content and which follow
//! - **Commands**: the replicated mutations and their binary framing
//! - **Transport**: the broadcast interface, plus an in-process loopback bus
//! - **Gateway**: apply-now vs replicate-and-wait-for-echo routing
//!
//! # Architecture
//!
//! ```text
//! ┌────────────── Authority ──────────────┐      ┌────────── Follower ──────────┐
//! │ store.append_turn()                   │      │                              │
//! │        │                              │      │                              │
//! │        ▼                              │      │                              │
//! │ ReplicationGateway::route() ──frame──▶│──bus─▶│ ReplicationGateway::poll()  │
//! │        ▲                              │      │        │                     │
//! │        └──── poll() (own echo) ◀──────│──bus─┘        ▼                     │
//! │                                       │      │ store.apply_command()        │
//! └───────────────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use colloquy_core::EventId;
//! use colloquy_netcode::{AuthorityRole, LoopbackBus, ReplicatedCommand, ReplicationGateway};
//!
//! let bus = LoopbackBus::new();
//! let host = ReplicationGateway::distributed(AuthorityRole::Authority, Arc::new(bus.endpoint()));
//! let client = ReplicationGateway::distributed(AuthorityRole::Follower, Arc::new(bus.endpoint()));
//!
//! let command = ReplicatedCommand::IgnoreEvent { id: EventId::ROOT, ignore_children: false };
//! host.route(command.clone(), |_| {}).unwrap();
//!
//! assert_eq!(host.poll().unwrap(), vec![command.clone()]);
//! assert_eq!(client.poll().unwrap(), vec![command]);
//! ```

mod authority;
mod command;
mod error;
mod gateway;
mod transport;

pub use authority::{AuthorityRole, ParticipantMode};
pub use command::ReplicatedCommand;
pub use error::{Error, Result};
pub use gateway::{Dispatch, ReplicationGateway};
pub use transport::{CommandTransport, LoopbackBus, LoopbackEndpoint};
