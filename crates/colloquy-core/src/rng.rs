//! Deterministic random number generator
//!
//! Uses a simple xorshift64 algorithm for reproducibility across platforms.
//! This ensures the same seed produces the same sequence on all participants.
//!
//! # Seeded scopes
//!
//! Every random draw that has to agree across participants goes through a
//! seeded scope:
//!
//! - [`with_seed`] builds a throwaway generator, so nothing ambient is touched
//! - [`GameRng::scoped`] borrows an existing generator, reseeds it for the
//!   duration of the closure and puts the previous state back afterwards
//! - [`SharedRng::with_seed`] does the same for a generator shared between
//!   threads, holding its lock for the whole scope

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// A deterministic random number generator
///
/// Uses xorshift64 for simplicity and reproducibility.
/// Never use thread-local or OS randomness in replicated logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed
    ///
    /// The seed is scrambled with SplitMix64 first so that small seeds
    /// (ticks, counters) still yield well-spread first draws.
    pub fn new(seed: u64) -> Self {
        Self::from_state(splitmix64(seed))
    }

    /// Create an RNG from a saved state
    pub fn from_state(state: u64) -> Self {
        // xorshift requires a non-zero state
        let state = if state == 0 { 1 } else { state };
        Self { state }
    }

    /// Get the current state (useful for saving/loading)
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a random f64 in range [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        // 53 high bits -> exact representable fraction strictly below 1.0
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Run `f` against this generator reseeded with `seed`, then restore the
    /// state it had before the call, however many draws `f` made.
    pub fn scoped<T>(&mut self, seed: u64, f: impl FnOnce(&mut GameRng) -> T) -> T {
        let saved = self.state;
        *self = GameRng::new(seed);
        let out = f(self);
        self.state = saved;
        out
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

/// Execute `f` against a fresh stream fully determined by `seed`.
///
/// Two participants calling this with the same seed and an equivalent `f`
/// draw the identical sequence, independent of any other random consumption
/// in the process.
pub fn with_seed<T>(seed: u64, f: impl FnOnce(&mut GameRng) -> T) -> T {
    let mut rng = GameRng::new(seed);
    f(&mut rng)
}

/// An ambient generator shared between threads.
///
/// Seeded scopes on it are serialized by the inner lock so a save/restore
/// pair never interleaves with another thread's scope.
#[derive(Debug, Clone, Default)]
pub struct SharedRng {
    inner: Arc<Mutex<GameRng>>,
}

impl SharedRng {
    /// Wrap a generator for shared use
    pub fn new(rng: GameRng) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rng)),
        }
    }

    /// Seeded scope over the ambient generator; see [`GameRng::scoped`].
    pub fn with_seed<T>(&self, seed: u64, f: impl FnOnce(&mut GameRng) -> T) -> T {
        let mut rng = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        rng.scoped(seed, f)
    }

    /// Snapshot of the ambient state
    pub fn state(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
