//! Deterministic event ids
//!
//! Every participant executing the same command stream mints the same id
//! for the same event, without a network round trip:
//!
//! ```text
//! bytes  0..4   shared tick (LE, low 32 bits)
//! bytes  4..8   sequence    (LE)
//! bytes  8..12  seeded draw (LE)
//! bytes 12..16  zero
//! ```
//!
//! Only valid under lockstep ordering. Standalone sessions use
//! [`EventId::random`] instead.

use crate::hash::hash_combine;
use crate::identity::EventId;
use crate::rng::with_seed;
use crate::time::Tick;
use std::sync::atomic::{AtomicU32, Ordering};

/// Mints reproducible 128-bit event ids
#[derive(Debug, Default)]
pub struct DeterministicIdGenerator {
    sequence: AtomicU32,
}

impl DeterministicIdGenerator {
    /// Create a generator with the sequence at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id for the given shared tick
    pub fn next_id(&self, tick: Tick) -> EventId {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        compose(tick as u32, seq)
    }

    /// Zero the sequence; called when a session is started or loaded
    pub fn reset(&self) {
        self.sequence.store(0, Ordering::SeqCst);
    }

    /// Last sequence value handed out
    pub fn sequence(&self) -> u32 {
        self.sequence.load(Ordering::SeqCst)
    }
}

fn compose(tick: u32, seq: u32) -> EventId {
    let seed = hash_combine(tick, seq);
    let draw = with_seed(seed as u64, |rng| rng.next_u32());

    let mut bytes = [0u8; 16];
    bytes[0..4].copy_from_slice(&tick.to_le_bytes());
    bytes[4..8].copy_from_slice(&seq.to_le_bytes());
    bytes[8..12].copy_from_slice(&draw.to_le_bytes());
    EventId::from_bytes(bytes)
}
