//! Shared tick source
//!
//! The tick is the lockstep clock every participant agrees on at the
//! moment a command executes. This crate only reads it; advancing it is the
//! scheduler's job.

use std::sync::atomic::{AtomicU64, Ordering};

/// A discrete tick identifier (logical time unit)
pub type Tick = u64;

/// Anything that can report the current shared tick
pub trait SharedTick: Send + Sync {
    /// The tick at the moment of the call
    fn current_tick(&self) -> Tick;
}

/// In-process tick counter
#[derive(Debug, Default)]
pub struct TickCounter {
    tick: AtomicU64,
}

impl TickCounter {
    /// Create a counter at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter at the given tick
    pub fn starting_at(tick: Tick) -> Self {
        Self {
            tick: AtomicU64::new(tick),
        }
    }

    /// Advance to the next tick, returning the new value
    pub fn advance(&self) -> Tick {
        self.tick.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Jump to a given tick (loading a session)
    pub fn set(&self, tick: Tick) {
        self.tick.store(tick, Ordering::SeqCst);
    }
}

impl SharedTick for TickCounter {
    fn current_tick(&self) -> Tick {
        self.tick.load(Ordering::SeqCst)
    }
}
