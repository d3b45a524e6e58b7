//! Transport traits for command replication
//!
//! The real network stack lives outside this workspace. A transport must
//! deliver every broadcast frame to every participant, the sender
//! included, in one global order. Duplicate delivery is tolerated by the
//! consumers; reordering is not.

use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Reliable, totally ordered broadcast
pub trait CommandTransport: Send + Sync {
    /// Broadcast a frame to all participants, including this one
    fn broadcast(&self, frame: &[u8]) -> Result<()>;

    /// Receive the next frame addressed to this participant (non-blocking)
    ///
    /// Returns `Ok(None)` if no frame is available.
    fn recv(&self) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Default)]
struct BusState {
    inboxes: Vec<VecDeque<Vec<u8>>>,
    frames_sent: u64,
    duplicate_delivery: bool,
    closed: bool,
}

/// In-process broadcast bus
///
/// Every endpoint's inbox is appended under one lock, so all endpoints see
/// frames in the same order.
#[derive(Debug, Clone, Default)]
pub struct LoopbackBus {
    state: Arc<Mutex<BusState>>,
}

impl LoopbackBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that delivers every frame twice, for at-least-once testing
    pub fn with_duplicates() -> Self {
        let bus = Self::new();
        bus.lock().duplicate_delivery = true;
        bus
    }

    /// Attach a new participant
    ///
    /// A participant joining late only sees frames broadcast after it joined.
    pub fn endpoint(&self) -> LoopbackEndpoint {
        let mut state = self.lock();
        state.inboxes.push(VecDeque::new());
        LoopbackEndpoint {
            bus: self.clone(),
            index: state.inboxes.len() - 1,
        }
    }

    /// Number of frames broadcast so far
    pub fn frames_sent(&self) -> u64 {
        self.lock().frames_sent
    }

    /// Reject further broadcasts
    pub fn close(&self) {
        self.lock().closed = true;
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One participant's view of a [`LoopbackBus`]
#[derive(Debug, Clone)]
pub struct LoopbackEndpoint {
    bus: LoopbackBus,
    index: usize,
}

impl LoopbackEndpoint {
    /// Frames waiting in this endpoint's inbox
    pub fn pending(&self) -> usize {
        self.bus.lock().inboxes[self.index].len()
    }
}

impl CommandTransport for LoopbackEndpoint {
    fn broadcast(&self, frame: &[u8]) -> Result<()> {
        let mut state = self.bus.lock();
        if state.closed {
            return Err(Error::Transport("loopback bus is closed".to_string()));
        }
        let copies = if state.duplicate_delivery { 2 } else { 1 };
        for inbox in state.inboxes.iter_mut() {
            for _ in 0..copies {
                inbox.push_back(frame.to_vec());
            }
        }
        state.frames_sent += 1;
        Ok(())
    }

    fn recv(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.bus.lock().inboxes[self.index].pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_sender_and_peers() {
        let bus = LoopbackBus::new();
        let host = bus.endpoint();
        let client = bus.endpoint();

        host.broadcast(b"one").unwrap();
        client.broadcast(b"two").unwrap();

        for endpoint in [&host, &client] {
            assert_eq!(endpoint.recv().unwrap(), Some(b"one".to_vec()));
            assert_eq!(endpoint.recv().unwrap(), Some(b"two".to_vec()));
            assert_eq!(endpoint.recv().unwrap(), None);
        }
        assert_eq!(bus.frames_sent(), 2);
    }

    #[test]
    fn test_duplicate_delivery() {
        let bus = LoopbackBus::with_duplicates();
        let endpoint = bus.endpoint();
        endpoint.broadcast(b"x").unwrap();
        assert_eq!(endpoint.pending(), 2);
        assert_eq!(bus.frames_sent(), 1);
    }

    #[test]
    fn test_closed_bus_rejects() {
        let bus = LoopbackBus::new();
        let endpoint = bus.endpoint();
        bus.close();
        assert!(matches!(endpoint.broadcast(b"x"), Err(Error::Transport(_))));
    }
}
