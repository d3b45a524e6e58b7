//! Colloquy Session - Lockstep conversation sessions
//!
//! Ties the deterministic primitives, the replication gateway and the
//! replicated history store into one [`Session`] per participant.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use colloquy_core::{Actor, ActorId, EventId, EventKind, PopulationGroup, TickCounter};
//! use colloquy_session::{Session, SessionConfig};
//!
//! let ticks = Arc::new(TickCounter::new());
//! let session = Session::standalone(SessionConfig::default(), ticks);
//! session.upsert_actor(Actor::new(ActorId::new(1), "Ada", PopulationGroup::Primary, 1.0));
//! session.start();
//!
//! let speaker = session.pick_speaker().actor().unwrap();
//! let line = session.mint_event(EventKind::Chat, "Ada", "Hello.", EventId::ROOT);
//! session.record_generation(speaker, "Greet someone", vec![line]).unwrap();
//!
//! assert_eq!(session.show_next(speaker).unwrap().text, "Hello.");
//! ```

mod config;
mod error;
mod session;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use session::Session;
