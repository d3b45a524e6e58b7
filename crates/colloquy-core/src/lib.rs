//! Colloquy Core - Deterministic primitives for lockstep conversation
//!
//! This crate provides the pieces every participant of a session computes
//! locally and must agree on bit-for-bit:
//! - Seeded random scopes that never disturb an ambient stream (`with_seed`)
//! - Reproducible 128-bit event ids (`DeterministicIdGenerator`)
//! - Weighted speaker selection with group capping (`WeightedSelector`)
//! - The data model: `Actor`, `Population`, `Event`, `Role`
//!
//! ## Determinism
//!
//! Nothing in this crate reads wall-clock time, OS randomness, or iterates
//! a hash map in a way that affects results. Inputs are the shared tick,
//! counters, and the population in its stable order.

mod actor;
mod event;
pub mod hash;
mod id_gen;
mod identity;
mod rng;
mod role;
mod selector;
pub mod time;

pub use actor::{Actor, Population, PopulationGroup};
pub use event::{Event, EventKind};
pub use hash::hash_combine;
pub use id_gen::DeterministicIdGenerator;
pub use identity::{ActorId, EventId};
pub use rng::{with_seed, GameRng, SharedRng};
pub use role::Role;
pub use selector::{Selection, SelectionPlan, WeightedSelector};
pub use time::{SharedTick, Tick, TickCounter};
