//! Per-actor queue of events waiting to be shown

use colloquy_core::{Event, EventId};
use std::collections::VecDeque;

/// Outbound events of one actor, oldest first, unique by id
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an event with this id is queued
    pub fn contains(&self, id: EventId) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    /// Enqueue unless an event with the same id is already queued.
    ///
    /// Returns true if the event was added.
    pub fn push_unique(&mut self, event: Event) -> bool {
        if self.contains(event.id) {
            return false;
        }
        self.events.push_back(event);
        true
    }

    /// Remove and return the first event matching `ready`, dropping every
    /// earlier event matching `discard` on the way. Discarded events are
    /// handed to `on_discard`.
    pub fn take_first(
        &mut self,
        mut discard: impl FnMut(&Event) -> bool,
        mut ready: impl FnMut(&Event) -> bool,
        mut on_discard: impl FnMut(Event),
    ) -> Option<Event> {
        let mut i = 0;
        while i < self.events.len() {
            if discard(&self.events[i]) {
                if let Some(event) = self.events.remove(i) {
                    on_discard(event);
                }
                continue;
            }
            if ready(&self.events[i]) {
                return self.events.remove(i);
            }
            i += 1;
        }
        None
    }

    /// Queued events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every queued event
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::EventKind;

    fn event(n: u8) -> Event {
        Event::new(EventId::from_bytes([n; 16]), EventKind::Chat, "Ada", format!("line {}", n))
    }

    #[test]
    fn test_push_unique() {
        let mut queue = EventQueue::new();
        assert!(queue.push_unique(event(1)));
        assert!(!queue.push_unique(event(1)));
        assert!(queue.push_unique(event(2)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_take_first_skips_waiting_and_drops_discarded() {
        let mut queue = EventQueue::new();
        for n in 1..=4 {
            queue.push_unique(event(n));
        }

        let mut dropped = Vec::new();
        let taken = queue.take_first(
            |e| e.id == EventId::from_bytes([1; 16]),
            |e| e.id == EventId::from_bytes([3; 16]),
            |e| dropped.push(e.id),
        );

        assert_eq!(taken.map(|e| e.id), Some(EventId::from_bytes([3; 16])));
        assert_eq!(dropped, vec![EventId::from_bytes([1; 16])]);
        let left: Vec<_> = queue.iter().map(|e| e.id).collect();
        assert_eq!(left, vec![EventId::from_bytes([2; 16]), EventId::from_bytes([4; 16])]);
    }

    #[test]
    fn test_take_first_none_ready() {
        let mut queue = EventQueue::new();
        queue.push_unique(event(1));
        assert!(queue.take_first(|_| false, |_| false, |_| {}).is_none());
        assert_eq!(queue.len(), 1);
    }
}
