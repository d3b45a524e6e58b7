//! Session - one participant's view of a lockstep conversation
//!
//! A session owns everything a participant needs to take part:
//! - the population speakers are drawn from
//! - the id generator for minted events
//! - the replicated history store and its gateway
//! - a handle on the shared tick
//!
//! Nothing here is global, so several sessions can live side by side in
//! one process (the integration tests run an authority and its followers
//! this way).

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use colloquy_core::{
    Actor, ActorId, DeterministicIdGenerator, Event, EventId, EventKind, Population, Selection,
    SharedTick, Tick, WeightedSelector,
};
use colloquy_history::payload::encode_events;
use colloquy_history::{HistoryEntry, ReplicatedHistoryStore};
use colloquy_netcode::{AuthorityRole, CommandTransport, Dispatch, ParticipantMode, ReplicationGateway};
use std::sync::{Arc, PoisonError, RwLock};

/// One participant of a conversation session
pub struct Session {
    config: SessionConfig,
    population: RwLock<Population>,
    ids: DeterministicIdGenerator,
    selector: WeightedSelector,
    store: ReplicatedHistoryStore,
    ticks: Arc<dyn SharedTick>,
}

impl Session {
    /// Create a single-participant session
    pub fn standalone(config: SessionConfig, ticks: Arc<dyn SharedTick>) -> Self {
        Self::with_gateway(config, ReplicationGateway::standalone(), ticks)
    }

    /// Create a participant of a lockstep session
    pub fn distributed(
        config: SessionConfig,
        role: AuthorityRole,
        transport: Arc<dyn CommandTransport>,
        ticks: Arc<dyn SharedTick>,
    ) -> Self {
        Self::with_gateway(config, ReplicationGateway::distributed(role, transport), ticks)
    }

    fn with_gateway(config: SessionConfig, gateway: ReplicationGateway, ticks: Arc<dyn SharedTick>) -> Self {
        let store = ReplicatedHistoryStore::new(config.history, Arc::new(gateway), Arc::clone(&ticks));
        Self {
            config,
            population: RwLock::new(Population::new()),
            ids: DeterministicIdGenerator::new(),
            selector: WeightedSelector::new(),
            store,
            ticks,
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// How this participant takes part
    pub fn mode(&self) -> ParticipantMode {
        self.store.mode()
    }

    /// The replicated history store
    pub fn store(&self) -> &ReplicatedHistoryStore {
        &self.store
    }

    /// The shared tick right now
    pub fn current_tick(&self) -> Tick {
        self.ticks.current_tick()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin a new session
    pub fn start(&self) {
        self.reset();
        tracing::info!(mode = %self.mode(), tick = self.current_tick(), "session started");
    }

    /// Resume a saved game; conversation state is never persisted
    pub fn load(&self) {
        self.reset();
        tracing::info!(mode = %self.mode(), tick = self.current_tick(), "session loaded");
    }

    /// End the session and drop all conversation state
    pub fn teardown(&self) {
        self.store.clear();
        self.store.discard_queues();
        tracing::info!(mode = %self.mode(), "session torn down");
    }

    fn reset(&self) {
        self.ids.reset();
        self.store.clear();
        self.store.discard_queues();
    }

    // ========================================================================
    // Population
    // ========================================================================

    /// Add an actor, or replace the one with the same id in place
    pub fn upsert_actor(&self, actor: Actor) {
        self.population.write().unwrap_or_else(PoisonError::into_inner).upsert(actor);
    }

    /// Remove an actor
    pub fn remove_actor(&self, id: ActorId) -> Option<Actor> {
        self.population.write().unwrap_or_else(PoisonError::into_inner).remove(id)
    }

    /// Update an actor's selection weight; false if the actor is unknown
    pub fn set_weight(&self, id: ActorId, weight: f64) -> bool {
        self.population
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_weight(id, weight)
    }

    /// Copy of the current population
    pub fn population(&self) -> Population {
        self.population.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Actor by id
    pub fn actor(&self, id: ActorId) -> Option<Actor> {
        self.population
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Pick who speaks at the current shared tick, or silence
    pub fn pick_speaker(&self) -> Selection {
        let population = self.population.read().unwrap_or_else(PoisonError::into_inner);
        self.selector.select(&population, self.current_tick())
    }

    /// Mint an event.
    ///
    /// In a lockstep session the id is derived from the shared tick and the
    /// session's sequence, so participants minting in the same order agree.
    /// A standalone session uses a random id.
    pub fn mint_event(
        &self,
        kind: EventKind,
        name: impl Into<String>,
        text: impl Into<String>,
        parent: EventId,
    ) -> Event {
        let id = if self.mode().is_distributed() {
            self.ids.next_id(self.current_tick())
        } else {
            EventId::random()
        };
        Event::new(id, kind, name, text).replying_to(parent)
    }

    /// Record the result of one generation for `actor`.
    ///
    /// The events are queued here first, then the prompt and the serialized
    /// events are appended as one turn. Followers queue the events when the
    /// turn reaches them.
    pub fn record_generation(&self, actor: ActorId, prompt: &str, events: Vec<Event>) -> Result<Dispatch> {
        if self.mode().role() != AuthorityRole::Authority {
            return Err(Error::NotAuthority);
        }
        if self.actor(actor).is_none() {
            return Err(Error::UnknownActor(actor));
        }

        let payload = encode_events(&events)?;
        let count = events.len();
        self.store.enqueue_local(actor, events);
        let dispatch = self.store.append_turn(actor, prompt, &payload)?;
        tracing::debug!(%actor, events = count, ?dispatch, "generation recorded");
        Ok(dispatch)
    }

    /// Ignore an event everywhere, cascading per configuration
    pub fn ignore_event(&self, id: EventId) -> Result<Dispatch> {
        self.ignore_event_with(id, self.config.ignore_children)
    }

    /// Ignore an event everywhere, choosing whether replies go with it
    pub fn ignore_event_with(&self, id: EventId, ignore_children: bool) -> Result<Dispatch> {
        Ok(self.store.request_ignore(id, ignore_children)?)
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    /// Apply every replicated command delivered so far.
    ///
    /// Returns the number of commands applied.
    pub fn pump(&self) -> Result<usize> {
        let commands = self
            .store
            .gateway()
            .poll()
            .map_err(colloquy_history::Error::from)?;
        let count = commands.len();
        for command in commands {
            self.store.apply_command(command);
        }
        Ok(count)
    }

    /// Take the next event of `actor` that can be shown and mark it spoken
    pub fn show_next(&self, actor: ActorId) -> Option<Event> {
        let event = self.store.take_next_ready(actor)?;
        self.store.mark_spoken(event.id);
        Some(event)
    }

    /// An actor's history, optionally simplified for prompt building
    pub fn history(&self, actor: ActorId, simplified: bool) -> Vec<HistoryEntry> {
        self.store.query_history(actor, simplified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{PopulationGroup, Role, TickCounter};

    fn ada() -> Actor {
        Actor::new(ActorId::new(1), "Ada", PopulationGroup::Primary, 1.0)
    }

    fn standalone() -> (Session, Arc<TickCounter>) {
        let ticks = Arc::new(TickCounter::starting_at(100));
        let session = Session::standalone(SessionConfig::default(), ticks.clone());
        session.upsert_actor(ada());
        session.start();
        (session, ticks)
    }

    #[test]
    fn test_standalone_round_trip() {
        let (session, _) = standalone();
        let id = ActorId::new(1);

        assert_eq!(session.pick_speaker(), Selection::Actor(id));

        let root = session.mint_event(EventKind::Chat, "Ada", "Nice day.", EventId::ROOT);
        let reply = session.mint_event(EventKind::Chat, "Ada", "Too nice.", root.id);
        let dispatch = session
            .record_generation(id, "Say something", vec![root.clone(), reply.clone()])
            .unwrap();
        assert_eq!(dispatch, Dispatch::Applied);
        assert_eq!(session.pump().unwrap(), 0);

        let history = session.history(id, true);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::Initiator);
        assert_eq!(history[1].text, "Ada: Nice day. Ada: Too nice.");

        assert_eq!(session.show_next(id).map(|e| e.id), Some(root.id));
        assert_eq!(session.store().spoken_tick(root.id), Some(100));
        assert_eq!(session.show_next(id).map(|e| e.id), Some(reply.id));
        assert!(session.show_next(id).is_none());
    }

    #[test]
    fn test_standalone_ids_are_random() {
        let (session, _) = standalone();
        let a = session.mint_event(EventKind::Chat, "Ada", "x", EventId::ROOT);
        let b = session.mint_event(EventKind::Chat, "Ada", "x", EventId::ROOT);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_unknown_actor_rejected() {
        let (session, _) = standalone();
        assert!(matches!(
            session.record_generation(ActorId::new(9), "hi", Vec::new()),
            Err(Error::UnknownActor(_))
        ));
    }

    #[test]
    fn test_ignore_uses_configured_cascade() {
        let ticks = Arc::new(TickCounter::new());
        let config = SessionConfig {
            ignore_children: true,
            ..SessionConfig::default()
        };
        let session = Session::standalone(config, ticks);
        session.upsert_actor(ada());

        let root = session.mint_event(EventKind::Chat, "Ada", "One", EventId::ROOT);
        let reply = session.mint_event(EventKind::Chat, "Ada", "Two", root.id);
        session
            .record_generation(ActorId::new(1), "p", vec![root.clone(), reply.clone()])
            .unwrap();

        session.ignore_event(root.id).unwrap();
        assert!(session.store().is_ignored(reply.id));
        assert!(session.show_next(ActorId::new(1)).is_none());
    }

    #[test]
    fn test_teardown_discards_everything() {
        let (session, _) = standalone();
        let id = ActorId::new(1);
        let event = session.mint_event(EventKind::Chat, "Ada", "x", EventId::ROOT);
        session.record_generation(id, "p", vec![event]).unwrap();

        session.teardown();
        assert!(session.history(id, false).is_empty());
        assert!(session.store().queued(id).is_empty());
    }

    #[test]
    fn test_silence_without_weight() {
        let (session, _) = standalone();
        assert!(session.set_weight(ActorId::new(1), 0.0));
        assert!(session.pick_speaker().is_silence());
        assert!(session.remove_actor(ActorId::new(1)).is_some());
        assert!(session.population().is_empty());
    }
}
