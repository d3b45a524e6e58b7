//! Replicated history store
//!
//! Holds, per actor, the bounded conversation log and the queue of events
//! waiting to be shown, plus two session-wide records: the tick at which
//! each event was spoken and the set of ignored events.
//!
//! Mutations that must happen identically everywhere (history lines and
//! ignore requests) go through the [`ReplicationGateway`]. In a distributed
//! session they take effect when the echo is handed to
//! [`ReplicatedHistoryStore::apply_command`], so every participant applies
//! them in the transport's global order.
//!
//! # Locking
//!
//! Each actor's state sits behind its own mutex. No operation holds two actor
//! locks at once, and the session-wide maps are only locked for point reads
//! and inserts.

use crate::config::HistoryConfig;
use crate::error::ErrorOnce;
use crate::log::{ConversationLog, HistoryEntry};
use crate::payload::decode_events;
use crate::queue::EventQueue;
use crate::text::{clean_line, expand_responder};
use crate::Result;
use colloquy_core::{ActorId, Event, EventId, Role, SharedTick, Tick};
use colloquy_netcode::{Dispatch, ParticipantMode, ReplicatedCommand, ReplicationGateway};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct ActorState {
    log: ConversationLog,
    queue: EventQueue,
}

type SharedActorState = Arc<Mutex<ActorState>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Per-actor conversation history with replicated mutations
pub struct ReplicatedHistoryStore {
    config: HistoryConfig,
    gateway: Arc<ReplicationGateway>,
    ticks: Arc<dyn SharedTick>,
    actors: RwLock<HashMap<ActorId, SharedActorState>>,
    spoken: RwLock<HashMap<EventId, Tick>>,
    ignored: RwLock<HashSet<EventId>>,
    /// Ignored ids whose descendants are ignored too
    cascading: RwLock<HashSet<EventId>>,
    errors: ErrorOnce,
}

impl ReplicatedHistoryStore {
    /// Create a store routing its mutations through `gateway`
    pub fn new(config: HistoryConfig, gateway: Arc<ReplicationGateway>, ticks: Arc<dyn SharedTick>) -> Self {
        Self {
            config,
            gateway,
            ticks,
            actors: RwLock::new(HashMap::new()),
            spoken: RwLock::new(HashMap::from([(EventId::ROOT, 0)])),
            ignored: RwLock::new(HashSet::new()),
            cascading: RwLock::new(HashSet::new()),
            errors: ErrorOnce::new(),
        }
    }

    /// Create a store for a single-participant session
    pub fn standalone(config: HistoryConfig, ticks: Arc<dyn SharedTick>) -> Self {
        Self::new(config, Arc::new(ReplicationGateway::standalone()), ticks)
    }

    /// Store configuration
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// How this participant takes part
    pub fn mode(&self) -> ParticipantMode {
        self.gateway.mode()
    }

    /// The gateway mutations are routed through
    pub fn gateway(&self) -> &Arc<ReplicationGateway> {
        &self.gateway
    }

    fn state(&self, actor: ActorId) -> SharedActorState {
        if let Some(state) = read(&self.actors).get(&actor) {
            return Arc::clone(state);
        }
        Arc::clone(write(&self.actors).entry(actor).or_default())
    }

    fn existing_state(&self, actor: ActorId) -> Option<SharedActorState> {
        read(&self.actors).get(&actor).cloned()
    }

    fn all_states(&self) -> Vec<SharedActorState> {
        read(&self.actors).values().cloned().collect()
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Record one exchange: the prompt line, then the response line.
    ///
    /// Standalone: both lines are applied now. Distributed: both are
    /// broadcast as one ordered pair and applied when they come back.
    pub fn append_turn(&self, actor: ActorId, user_text: &str, response_text: &str) -> Result<Dispatch> {
        let commands = vec![
            ReplicatedCommand::AddHistory {
                actor,
                role: Role::Initiator,
                text: user_text.to_string(),
            },
            ReplicatedCommand::AddHistory {
                actor,
                role: Role::Responder,
                text: response_text.to_string(),
            },
        ];
        Ok(self.gateway.route_batch(commands, |command| self.apply_command(command))?)
    }

    fn append_line(&self, actor: ActorId, role: Role, text: String) {
        let state = self.state(actor);
        let mut state = lock(&state);
        state.log.push(role, text);
        state.log.enforce_invariants(self.config.max_entries());
    }

    /// Apply a command delivered by the gateway
    pub fn apply_command(&self, command: ReplicatedCommand) {
        match command {
            ReplicatedCommand::AddHistory { actor, role, text } => {
                if role == Role::Responder && self.mode().merges_replicated_payloads() && !text.trim().is_empty() {
                    self.apply_replicated_response_payload(actor, &text);
                }
                self.append_line(actor, role, text);
            }
            ReplicatedCommand::IgnoreEvent { id, ignore_children } => {
                self.mark_ignored(id, ignore_children);
            }
        }
    }

    /// Snapshot of an actor's log.
    ///
    /// `simplified` expands responder payloads into `name: text` lines,
    /// strips markup, and drops lines left blank.
    pub fn query_history(&self, actor: ActorId, simplified: bool) -> Vec<HistoryEntry> {
        let Some(state) = self.existing_state(actor) else {
            return Vec::new();
        };
        let entries = lock(&state).log.entries().to_vec();
        if !simplified {
            return entries;
        }

        entries
            .into_iter()
            .filter_map(|entry| {
                let text = match entry.role {
                    Role::Responder => expand_responder(&entry.text),
                    Role::Initiator => entry.text,
                };
                let text = clean_line(&text);
                (!text.is_empty()).then(|| HistoryEntry::new(entry.role, text))
            })
            .collect()
    }

    // ========================================================================
    // Event queues
    // ========================================================================

    /// Enqueue events the local participant generated itself.
    ///
    /// Returns the number of events added; ids already queued are skipped.
    pub fn enqueue_local(&self, actor: ActorId, events: impl IntoIterator<Item = Event>) -> usize {
        let state = self.state(actor);
        let mut state = lock(&state);
        let mut added = 0;
        for event in events {
            if state.queue.push_unique(event) {
                added += 1;
            }
        }
        added
    }

    /// Merge a replicated responder payload into an actor's queue.
    ///
    /// Does nothing unless this participant is a follower: the authority
    /// queued the same events before replicating them. Events already queued,
    /// already spoken or already ignored are skipped, so a repeated delivery
    /// changes nothing even after the first copy was shown. A payload that
    /// does not parse is logged once per distinct failure and dropped.
    ///
    /// Returns the number of events added.
    pub fn apply_replicated_response_payload(&self, actor: ActorId, payload: &str) -> usize {
        if !self.mode().merges_replicated_payloads() {
            return 0;
        }

        let events = match decode_events(payload) {
            Ok(events) => events,
            Err(e) => {
                self.errors.report("responder payload", &e);
                return 0;
            }
        };

        let fresh: Vec<Event> = events.into_iter().filter(|e| !self.is_handled(e.id)).collect();
        let added = self.enqueue_local(actor, fresh);
        tracing::debug!(%actor, added, "merged replicated payload");
        added
    }

    /// Remove and return the next event of `actor` that can be shown.
    ///
    /// Ignored events met on the way are dropped. An event is ready once its
    /// parent has a spoken tick; root events are always ready.
    pub fn take_next_ready(&self, actor: ActorId) -> Option<Event> {
        let state = self.existing_state(actor)?;
        let mut state = lock(&state);
        state.queue.take_first(
            |event| self.is_suppressed(event),
            |event| read(&self.spoken).contains_key(&event.parent_id),
            |event| self.on_discarded(actor, event),
        )
    }

    fn is_handled(&self, id: EventId) -> bool {
        read(&self.spoken).contains_key(&id) || read(&self.ignored).contains(&id)
    }

    fn is_suppressed(&self, event: &Event) -> bool {
        read(&self.ignored).contains(&event.id) || read(&self.cascading).contains(&event.parent_id)
    }

    fn on_discarded(&self, actor: ActorId, event: Event) {
        let inherited = read(&self.cascading).contains(&event.parent_id);
        if inherited {
            write(&self.ignored).insert(event.id);
            write(&self.cascading).insert(event.id);
        }
        tracing::debug!(%actor, id = %event.id, "dropped ignored event");
    }

    /// Copy of an actor's queue, oldest first
    pub fn queued(&self, actor: ActorId) -> Vec<Event> {
        self.existing_state(actor)
            .map(|state| lock(&state).queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Spoken and ignored records
    // ========================================================================

    /// Record that an event was shown at the current shared tick.
    ///
    /// The first record wins; returns false if the id was already spoken.
    pub fn mark_spoken(&self, id: EventId) -> bool {
        let tick = self.ticks.current_tick();
        let mut spoken = write(&self.spoken);
        if spoken.contains_key(&id) {
            return false;
        }
        spoken.insert(id, tick);
        true
    }

    /// Tick at which an event was spoken
    pub fn spoken_tick(&self, id: EventId) -> Option<Tick> {
        read(&self.spoken).get(&id).copied()
    }

    /// Ignore an event locally.
    ///
    /// With `ignore_children`, every queued descendant (following parent
    /// links) is ignored now, and descendants arriving later are dropped
    /// when they reach the front of their queue.
    pub fn mark_ignored(&self, id: EventId, ignore_children: bool) {
        if id.is_root() {
            tracing::warn!("refusing to ignore the root event");
            return;
        }

        write(&self.ignored).insert(id);
        if !ignore_children {
            return;
        }

        let mut links = Vec::new();
        for state in self.all_states() {
            let state = lock(&state);
            links.extend(state.queue.iter().map(|e| (e.id, e.parent_id)));
        }

        let mut doomed = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for (child, parent) in &links {
                if doomed.contains(parent) {
                    doomed.insert(*child);
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        tracing::debug!(%id, descendants = doomed.len() - 1, "ignoring event and its replies");
        write(&self.ignored).extend(doomed.iter().copied());
        write(&self.cascading).extend(doomed);
    }

    /// Ignore an event on every participant
    pub fn request_ignore(&self, id: EventId, ignore_children: bool) -> Result<Dispatch> {
        let command = ReplicatedCommand::IgnoreEvent { id, ignore_children };
        Ok(self.gateway.route(command, |command| self.apply_command(command))?)
    }

    /// Whether an event is ignored
    pub fn is_ignored(&self, id: EventId) -> bool {
        read(&self.ignored).contains(&id)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Empty every log and the spoken and ignored records.
    ///
    /// Queues are kept. A queued reply whose parent's spoken tick is wiped
    /// here only becomes ready if the parent is spoken again, so the number
    /// of such replies is logged.
    pub fn clear(&self) {
        let mut at_risk = 0;
        for state in self.all_states() {
            let mut state = lock(&state);
            state.log.clear();
            at_risk += state.queue.iter().filter(|e| e.is_reply()).count();
        }

        {
            let mut spoken = write(&self.spoken);
            spoken.clear();
            spoken.insert(EventId::ROOT, 0);
        }
        write(&self.ignored).clear();
        write(&self.cascading).clear();
        self.errors.reset();

        if at_risk > 0 {
            tracing::warn!(at_risk, "history cleared while replies are still queued");
        }
    }

    /// Drop every queued event
    pub fn discard_queues(&self) {
        for state in self.all_states() {
            lock(&state).queue.clear();
        }
    }
}

impl fmt::Debug for ReplicatedHistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicatedHistoryStore")
            .field("config", &self.config)
            .field("mode", &self.mode())
            .field("actors", &read(&self.actors).len())
            .field("spoken", &read(&self.spoken).len())
            .field("ignored", &read(&self.ignored).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::encode_events;
    use colloquy_core::{EventKind, TickCounter};

    const ADA: ActorId = ActorId(1);

    fn store(max_pairs: usize) -> (ReplicatedHistoryStore, Arc<TickCounter>) {
        let ticks = Arc::new(TickCounter::new());
        let store = ReplicatedHistoryStore::standalone(HistoryConfig::with_max_pairs(max_pairs), ticks.clone());
        (store, ticks)
    }

    fn event(n: u8, parent: EventId) -> Event {
        Event::new(EventId::from_bytes([n; 16]), EventKind::Chat, "Ada", format!("line {}", n)).replying_to(parent)
    }

    fn id(n: u8) -> EventId {
        EventId::from_bytes([n; 16])
    }

    #[test]
    fn test_append_turn_standalone_evicts_oldest_pair() {
        let (store, _) = store(2);
        for i in 1..=3 {
            let dispatch = store.append_turn(ADA, &format!("q{}", i), &format!("a{}", i)).unwrap();
            assert_eq!(dispatch, Dispatch::Applied);
        }

        let texts: Vec<String> = store.query_history(ADA, false).into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["q2", "a2", "q3", "a3"]);
    }

    #[test]
    fn test_zero_pairs_keeps_no_history() {
        let (store, _) = store(0);
        store.append_turn(ADA, "q", "a").unwrap();
        assert!(store.query_history(ADA, false).is_empty());
    }

    #[test]
    fn test_concurrent_turns_keep_logs_bounded_and_alternating() {
        let (store, _) = store(2);
        let actors: Vec<ActorId> = (1..=4).map(ActorId::new).collect();

        std::thread::scope(|scope| {
            for &actor in &actors {
                // Two writers per actor, every actor at once
                for writer in 0..2 {
                    let store = &store;
                    scope.spawn(move || {
                        for i in 0..200 {
                            store
                                .append_turn(actor, &format!("q{}-{}", writer, i), &format!("a{}-{}", writer, i))
                                .unwrap();
                        }
                    });
                }
            }
        });

        for actor in actors {
            let log = store.query_history(actor, false);
            assert!(!log.is_empty());
            assert!(log.len() <= 4);
            assert!(log.windows(2).all(|w| w[0].role != w[1].role));
        }
    }

    #[test]
    fn test_query_unknown_actor_is_empty() {
        let (store, _) = store(3);
        assert!(store.query_history(ActorId(99), true).is_empty());
        assert!(store.queued(ActorId(99)).is_empty());
        assert!(store.take_next_ready(ActorId(99)).is_none());
    }

    #[test]
    fn test_simplified_history() {
        let (store, _) = store(3);
        let events = vec![
            Event::new(id(1), EventKind::Chat, "Ada", "<i>Cold</i> today."),
            Event::new(id(2), EventKind::Chat, "Bob", "Very\ncold."),
        ];
        store.append_turn(ADA, "Talk about\nthe weather", &encode_events(&events).unwrap()).unwrap();
        store.append_turn(ADA, "<b></b>", "Fine.").unwrap();

        let simplified: Vec<String> = store.query_history(ADA, true).into_iter().map(|e| e.text).collect();
        assert_eq!(
            simplified,
            vec!["Talk about the weather", "Ada: Cold today. Bob: Very cold.", "Fine."]
        );
    }

    #[test]
    fn test_mark_spoken_first_write_wins() {
        let (store, ticks) = store(3);
        ticks.set(10);
        assert!(store.mark_spoken(id(1)));
        ticks.set(20);
        assert!(!store.mark_spoken(id(1)));
        assert_eq!(store.spoken_tick(id(1)), Some(10));
        assert_eq!(store.spoken_tick(EventId::ROOT), Some(0));
    }

    #[test]
    fn test_take_next_ready_waits_for_parent() {
        let (store, _) = store(3);
        store.enqueue_local(ADA, vec![event(1, EventId::ROOT), event(2, id(1))]);

        let first = store.take_next_ready(ADA).unwrap();
        assert_eq!(first.id, id(1));
        assert!(store.take_next_ready(ADA).is_none());

        store.mark_spoken(first.id);
        assert_eq!(store.take_next_ready(ADA).map(|e| e.id), Some(id(2)));
    }

    #[test]
    fn test_enqueue_local_deduplicates() {
        let (store, _) = store(3);
        assert_eq!(store.enqueue_local(ADA, vec![event(1, EventId::ROOT), event(1, EventId::ROOT)]), 1);
        assert_eq!(store.enqueue_local(ADA, vec![event(1, EventId::ROOT)]), 0);
        assert_eq!(store.queued(ADA).len(), 1);
    }

    #[test]
    fn test_standalone_never_merges_payloads() {
        let (store, _) = store(3);
        let payload = encode_events(&[event(1, EventId::ROOT)]).unwrap();
        assert_eq!(store.apply_replicated_response_payload(ADA, &payload), 0);
        store.append_turn(ADA, "q", &payload).unwrap();
        assert!(store.queued(ADA).is_empty());
    }

    #[test]
    fn test_ignore_without_children() {
        let (store, _) = store(3);
        store.enqueue_local(ADA, vec![event(1, EventId::ROOT), event(2, id(1)), event(3, EventId::ROOT)]);

        store.request_ignore(id(1), false).unwrap();
        assert!(store.is_ignored(id(1)));
        assert!(!store.is_ignored(id(2)));

        // 1 is dropped, 2 waits on its never-spoken parent, 3 is ready
        assert_eq!(store.take_next_ready(ADA).map(|e| e.id), Some(id(3)));
        assert_eq!(store.queued(ADA).len(), 1);
    }

    #[test]
    fn test_ignore_cascades_eagerly_and_lazily() {
        let (store, _) = store(3);
        let bob = ActorId(2);
        store.enqueue_local(ADA, vec![event(1, EventId::ROOT)]);
        store.enqueue_local(bob, vec![event(2, id(1))]);
        store.enqueue_local(ADA, vec![event(3, id(2))]);

        store.mark_ignored(id(1), true);
        for n in 1..=3 {
            assert!(store.is_ignored(id(n)));
        }

        // A grandchild arriving after the ignore is filtered when reached
        store.enqueue_local(bob, vec![event(4, id(3)), event(5, EventId::ROOT)]);
        assert!(!store.is_ignored(id(4)));
        assert_eq!(store.take_next_ready(bob).map(|e| e.id), Some(id(5)));
        assert!(store.is_ignored(id(4)));
        assert!(store.take_next_ready(ADA).is_none());
        assert!(store.queued(ADA).is_empty());
    }

    #[test]
    fn test_root_cannot_be_ignored() {
        let (store, _) = store(3);
        store.enqueue_local(ADA, vec![event(1, EventId::ROOT)]);
        store.mark_ignored(EventId::ROOT, true);
        assert!(!store.is_ignored(EventId::ROOT));
        assert!(!store.is_ignored(id(1)));
    }

    #[test]
    fn test_clear_keeps_queues_and_strands_replies() {
        let (store, _) = store(3);
        store.append_turn(ADA, "q", "a").unwrap();
        store.enqueue_local(ADA, vec![event(2, id(1))]);
        store.mark_spoken(id(1));
        store.mark_ignored(id(9), false);

        store.clear();

        assert!(store.query_history(ADA, false).is_empty());
        assert_eq!(store.spoken_tick(id(1)), None);
        assert_eq!(store.spoken_tick(EventId::ROOT), Some(0));
        assert!(!store.is_ignored(id(9)));
        assert_eq!(store.queued(ADA).len(), 1);
        assert!(store.take_next_ready(ADA).is_none());

        store.discard_queues();
        assert!(store.queued(ADA).is_empty());
    }
}
