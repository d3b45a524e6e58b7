//! Lockstep Chat Example
//!
//! Runs one authority and two followers in a single process, connected by a
//! loopback bus that delivers every frame twice. Each round the participants
//! agree on a speaker, the authority "generates" a short exchange, and every
//! participant plays it back in causal order. A short standalone session
//! follows, where the same calls apply immediately with random ids.
//!
//! Pass a RON config path as the first argument to override the defaults.
//! Set `RUST_LOG=debug` to watch the replication traffic.

use colloquy_core::{
    Actor, ActorId, Event, EventId, EventKind, PopulationGroup, Selection, SharedTick, TickCounter,
};
use colloquy_netcode::{AuthorityRole, LoopbackBus};
use colloquy_session::{Result, Session, SessionConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const ROUNDS: usize = 6;

fn cast() -> Vec<Actor> {
    vec![
        Actor::new(ActorId::new(1), "Ada", PopulationGroup::Primary, 0.2),
        Actor::new(ActorId::new(2), "Bob", PopulationGroup::Primary, 0.1),
        Actor::new(ActorId::new(3), "Wren", PopulationGroup::Visiting, 0.2),
        Actor::new(ActorId::new(4), "Raider", PopulationGroup::Hostile, 2.0),
    ]
}

/// Stand-in for the text generator: an opener and a reply
fn generate(session: &Session, speaker: &Actor, round: usize) -> Vec<Event> {
    let opener = session.mint_event(
        EventKind::Chat,
        speaker.name.as_str(),
        format!("<i>Round {}</i>, anyone awake?", round),
        EventId::ROOT,
    );
    let reply = session
        .mint_event(EventKind::Chat, "Bob", "Barely.", opener.id)
        .with_target(speaker.name.as_str());
    vec![opener, reply]
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::load_file(path)?,
        None => SessionConfig::default(),
    };
    info!(?config, "=== Colloquy Lockstep Chat ===");

    let bus = LoopbackBus::with_duplicates();
    let ticks = Arc::new(TickCounter::new());
    let join = |role| Session::distributed(config.clone(), role, Arc::new(bus.endpoint()), ticks.clone());
    let participants = [
        ("host", join(AuthorityRole::Authority)),
        ("client-1", join(AuthorityRole::Follower)),
        ("client-2", join(AuthorityRole::Follower)),
    ];

    for (_, session) in &participants {
        for actor in cast() {
            session.upsert_actor(actor);
        }
        session.start();
    }

    let host = &participants[0].1;
    for round in 1..=ROUNDS {
        let tick = ticks.advance();

        let picks: Vec<Selection> = participants.iter().map(|(_, s)| s.pick_speaker()).collect();
        debug_assert!(picks.windows(2).all(|w| w[0] == w[1]));

        let Selection::Actor(speaker) = picks[0] else {
            info!(tick, "nobody speaks");
            continue;
        };
        let Some(actor) = host.actor(speaker) else {
            continue;
        };

        let events = generate(host, &actor, round);
        host.record_generation(speaker, "Start a conversation", events)?;

        for (label, session) in &participants {
            session.pump()?;
            while let Some(event) = session.show_next(speaker) {
                info!(participant = *label, tick, id = %event.id, "{}: {}", event.name, event.text);
            }
        }
    }

    let raider = ActorId::new(4);
    for (label, session) in &participants {
        for entry in session.history(raider, true) {
            info!(participant = *label, role = %entry.role, "{}", entry.text);
        }
    }

    for (_, session) in &participants {
        session.teardown();
    }
    info!(frames = bus.frames_sent(), "lockstep run done");

    run_standalone(&config)
}

/// One participant, no replication: every mutation lands on the spot
fn run_standalone(config: &SessionConfig) -> Result<()> {
    let ticks = Arc::new(TickCounter::new());
    let session = Session::standalone(config.clone(), ticks.clone());
    for actor in cast() {
        session.upsert_actor(actor);
    }
    session.start();

    for round in 1..=ROUNDS {
        ticks.advance();
        let Some(actor) = session.pick_speaker().actor().and_then(|id| session.actor(id)) else {
            info!(tick = ticks.current_tick(), "standalone: nobody speaks");
            continue;
        };

        let events = generate(&session, &actor, round);
        let dispatch = session.record_generation(actor.id, "Start a conversation", events)?;
        while let Some(event) = session.show_next(actor.id) {
            info!(?dispatch, id = %event.id, "standalone {}: {}", event.name, event.text);
        }
    }

    session.teardown();
    info!("standalone run done");
    Ok(())
}
