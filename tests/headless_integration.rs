use std::sync::mpsc;
use std::time::Duration;

use assert_matches::assert_matches;
use lightsout::clock::ManualClock;
use lightsout::engine::{Engine, GameState, SequenceEvent, TriggerOutcome};
use lightsout::history::{HistoryLedger, JUMP_START_SENTINEL};
use lightsout::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use lightsout::session::SessionConfig;
use lightsout::store::{HistoryStore, JsonFileStore, MemoryStore};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Headless integration using the internal runtime + Engine without a TTY.
// Real time only paces the runner; the engine sees simulated time that moves
// 20 ms per tick.

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn fixed_hold_config() -> SessionConfig {
    SessionConfig {
        hold_min: ms(1_000),
        hold_max: ms(1_000),
        ..SessionConfig::default()
    }
}

fn engine_with<S: HistoryStore>(clock: &ManualClock, store: S) -> Engine<ManualClock, S> {
    Engine::with_rng(
        fixed_hold_config(),
        clock.clone(),
        store,
        StdRng::seed_from_u64(11),
    )
}

/// Drives the engine until a cycle settles, reacting `reaction` after lights out
fn drive_one_cycle<S: HistoryStore>(
    clock: &ManualClock,
    engine: &mut Engine<ManualClock, S>,
    reaction: Duration,
) -> (Vec<TriggerOutcome>, Vec<SequenceEvent>) {
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(ms(1)));
    tx.send(GameEvent::Trigger).unwrap();

    let mut outcomes = Vec::new();
    let mut events = Vec::new();
    for _ in 0..1_000u32 {
        match runner.step() {
            GameEvent::Trigger => outcomes.push(engine.on_trigger()),
            GameEvent::Tick => clock.advance(ms(20)),
            GameEvent::Reset | GameEvent::Quit => break,
        }
        for event in engine.tick() {
            if let SequenceEvent::LightsOut { at } = event {
                clock.set(at + reaction);
                tx.send(GameEvent::Trigger).unwrap();
            }
            events.push(event);
        }
        if engine.state().is_settled() {
            break;
        }
    }
    (outcomes, events)
}

#[test]
fn headless_cycle_measures_reaction() {
    let clock = ManualClock::new();
    let mut engine = engine_with(&clock, MemoryStore::default());

    let (outcomes, events) = drive_one_cycle(&clock, &mut engine, ms(180));

    assert_eq!(engine.state(), GameState::Result);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0], TriggerOutcome::Started);
    assert_matches!(&outcomes[1], TriggerOutcome::Reaction(v) => {
        assert!((v.attempt.reaction_time - 0.180).abs() < 1e-6);
        assert!(v.is_new_best);
        assert!(v.is_elite);
    });

    let lamps: Vec<(u8, Duration)> = events
        .iter()
        .filter_map(|e| match e {
            SequenceEvent::LampLit { lamp, at } => Some((*lamp, *at)),
            _ => None,
        })
        .collect();
    assert_eq!(
        lamps,
        vec![
            (1, ms(1_000)),
            (2, ms(2_000)),
            (3, ms(3_000)),
            (4, ms(4_000)),
            (5, ms(5_000))
        ]
    );
    assert!(events.contains(&SequenceEvent::LightsOut { at: ms(6_000) }));
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn headless_jump_start_then_reset() {
    let clock = ManualClock::new();
    let mut engine = engine_with(&clock, MemoryStore::default());

    assert_eq!(engine.on_trigger(), TriggerOutcome::Started);
    clock.set_ms(2_100);
    engine.tick();
    assert_eq!(engine.active_lamps(), 2);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(ms(1)));
    tx.send(GameEvent::Trigger).unwrap();
    tx.send(GameEvent::Reset).unwrap();

    assert_eq!(runner.step(), GameEvent::Trigger);
    assert_matches!(engine.on_trigger(), TriggerOutcome::JumpStart(v) => {
        assert_eq!(v.attempt.reaction_time, JUMP_START_SENTINEL);
        assert!(!v.is_new_best);
    });
    assert_eq!(engine.state(), GameState::JumpStart);
    assert_eq!(engine.active_lamps(), 0);

    // the remaining lamps never light
    clock.set_ms(10_000);
    assert!(engine.tick().is_empty());

    assert_eq!(runner.step(), GameEvent::Reset);
    engine.reset_to_idle();
    assert_eq!(engine.state(), GameState::Idle);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.best_time(), None);
}

#[test]
fn headless_session_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let clock = ManualClock::new();
    let mut engine = engine_with(&clock, JsonFileStore::with_path(&path));
    drive_one_cycle(&clock, &mut engine, ms(240));
    assert_eq!(engine.state(), GameState::Result);
    drop(engine);

    let ledger = HistoryLedger::open(JsonFileStore::with_path(&path), 50);
    assert_eq!(ledger.history().len(), 1);
    let best = ledger.best_time().unwrap();
    assert!((best - 0.240).abs() < 1e-6);

    // a second session starts from the stored best
    let clock = ManualClock::new();
    let mut engine = engine_with(&clock, JsonFileStore::with_path(&path));
    let (outcomes, _) = drive_one_cycle(&clock, &mut engine, ms(300));
    assert_matches!(&outcomes[1], TriggerOutcome::Reaction(v) => {
        assert!(!v.is_new_best);
        assert!(!v.is_elite);
    });
    assert_eq!(engine.history().len(), 2);
    assert!((engine.best_time().unwrap() - 0.240).abs() < 1e-6);
}
