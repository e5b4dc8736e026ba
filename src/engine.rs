//! The start-light state machine.
//!
//! One [`Engine`] is one game session: it owns the clock, the scheduler for the
//! current run, the input gate and the history ledger, and nothing outside it
//! mutates any of them. Hosts feed it two things, triggers (`on_trigger`) and
//! the passage of time (`tick`), and read back state, sequence events and the
//! verdict of the last completed cycle.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::celebration::CelebrationLevel;
use crate::clock::{secs_between, Clock};
use crate::gate::{GateDecision, InputGate};
use crate::history::{Attempt, History, HistoryLedger, JUMP_START_SENTINEL};
use crate::scheduler::Scheduler;
use crate::session::SessionConfig;
use crate::stats::{PerformanceTier, Summary};
use crate::store::HistoryStore;

pub const LAMP_COUNT: u8 = 5;

/// Floor applied to a valid reaction measured at the lights-out instant itself
pub const MIN_REACTION_SECS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    #[default]
    Idle,
    Countdown,
    Waiting,
    Result,
    JumpStart,
}

impl GameState {
    /// A cycle has finished and its outcome is on display
    pub fn is_settled(&self) -> bool {
        matches!(self, GameState::Result | GameState::JumpStart)
    }
}

/// Delayed actions armed during a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStep {
    LightLamp(u8),
    LightsOut,
}

/// Bookkeeping for the current countdown-to-result cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceRun {
    pub started_at: Option<Duration>,
    pub hold: Option<Duration>,
    /// Where lights-out was due once the hold was rolled
    pub scheduled_lights_out: Option<Duration>,
    /// When lights-out actually happened
    pub lights_out_at: Option<Duration>,
    pub active_lamps: u8,
    terminal_taken: bool,
}

impl SequenceRun {
    /// Whether this cycle already accepted its one terminal trigger
    pub fn terminal_taken(&self) -> bool {
        self.terminal_taken
    }
}

/// Side effects of scheduled steps, for a rendering collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    LampLit { lamp: u8, at: Duration },
    HoldRolled { hold: Duration, lights_out_due: Duration },
    LightsOut { at: Duration },
}

/// Outcome of a completed cycle plus advisory flags for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub attempt: Attempt,
    pub is_new_best: bool,
    pub is_elite: bool,
    pub celebration: CelebrationLevel,
}

impl Verdict {
    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::from_reaction(self.attempt.reaction_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// A new countdown began
    Started,
    JumpStart(Verdict),
    Reaction(Verdict),
    /// Dropped by the input gate
    Rejected(GateDecision),
    /// Dropped because the cycle already took its terminal trigger
    Ignored,
}

#[derive(Debug)]
pub struct Engine<C, S> {
    config: SessionConfig,
    clock: C,
    scheduler: Scheduler<C, SequenceStep>,
    gate: InputGate,
    ledger: HistoryLedger<S>,
    rng: StdRng,
    state: GameState,
    run: SequenceRun,
    last_verdict: Option<Verdict>,
    events: Vec<SequenceEvent>,
}

impl<C: Clock + Clone, S: HistoryStore> Engine<C, S> {
    pub fn new(config: SessionConfig, clock: C, store: S) -> Self {
        Self::with_rng(config, clock, store, StdRng::from_entropy())
    }

    /// Like `new`, with an explicit source for the randomized hold
    pub fn with_rng(config: SessionConfig, clock: C, store: S, rng: StdRng) -> Self {
        let ledger = HistoryLedger::open(store, config.history_capacity);
        Self {
            scheduler: Scheduler::new(clock.clone()),
            gate: InputGate::new(config.debounce, config.result_cooldown),
            ledger,
            rng,
            clock,
            config,
            state: GameState::Idle,
            run: SequenceRun::default(),
            last_verdict: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn active_lamps(&self) -> u8 {
        self.run.active_lamps
    }

    pub fn run(&self) -> &SequenceRun {
        &self.run
    }

    pub fn last_verdict(&self) -> Option<&Verdict> {
        self.last_verdict.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn ledger(&self) -> &HistoryLedger<S> {
        &self.ledger
    }

    pub fn history(&self) -> &History {
        self.ledger.history()
    }

    pub fn best_time(&self) -> Option<f64> {
        self.ledger.best_time()
    }

    pub fn summary(&self) -> Summary {
        self.ledger.summary()
    }

    /// Deadline of the next scheduled step, so hosts can sleep exactly that long
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Runs every step whose deadline has passed and drains pending events
    pub fn tick(&mut self) -> Vec<SequenceEvent> {
        self.run_due_steps();
        std::mem::take(&mut self.events)
    }

    /// Interprets one trigger at the current clock reading.
    ///
    /// Steps that fell due before the trigger run first, so a reaction right
    /// after lights-out is never mistaken for a jump start.
    pub fn on_trigger(&mut self) -> TriggerOutcome {
        self.run_due_steps();
        let now = self.clock.now();

        let decision = self.gate.check(now, self.state);
        if !decision.is_accepted() {
            trace!(?decision, state = %self.state, "trigger rejected");
            return TriggerOutcome::Rejected(decision);
        }

        match self.state {
            GameState::Idle | GameState::Result | GameState::JumpStart => {
                self.start_cycle();
                TriggerOutcome::Started
            }
            // jump_start and react settle synchronously, so this only matters
            // if a terminal trigger is ever taken without settling the run
            GameState::Countdown | GameState::Waiting if self.run.terminal_taken => {
                trace!(state = %self.state, "terminal trigger already taken");
                TriggerOutcome::Ignored
            }
            GameState::Countdown => self.jump_start(now),
            GameState::Waiting => self.react(now),
        }
    }

    /// Abandons the current run and returns to idle; history is kept
    pub fn reset_to_idle(&mut self) {
        self.scheduler.cancel_all();
        self.run = SequenceRun::default();
        self.last_verdict = None;
        self.events.clear();
        self.state = GameState::Idle;
        debug!("reset to idle");
    }

    pub fn clear_history(&mut self) {
        self.ledger.clear();
    }

    fn run_due_steps(&mut self) {
        while let Some(fired) = self.scheduler.poll_due() {
            self.apply(fired.action, fired.due);
        }
    }

    fn start_cycle(&mut self) {
        self.scheduler.cancel_all();
        self.run = SequenceRun {
            started_at: Some(self.clock.now()),
            ..SequenceRun::default()
        };
        self.last_verdict = None;
        self.state = GameState::Countdown;

        for lamp in 1..=LAMP_COUNT {
            self.scheduler.schedule(
                self.config.lamp_interval.saturating_mul(u32::from(lamp)),
                SequenceStep::LightLamp(lamp),
            );
        }
        debug!(generation = self.scheduler.generation(), "countdown started");
    }

    /// Applies a step as of its deadline, however late it is being polled
    fn apply(&mut self, step: SequenceStep, due: Duration) {
        if self.state != GameState::Countdown {
            return;
        }
        match step {
            SequenceStep::LightLamp(lamp) => {
                self.run.active_lamps = lamp;
                self.events.push(SequenceEvent::LampLit { lamp, at: due });
                trace!(lamp, ?due, "lamp lit");
                if lamp == LAMP_COUNT {
                    self.roll_hold(due);
                }
            }
            SequenceStep::LightsOut => {
                self.run.lights_out_at = Some(due);
                self.run.active_lamps = 0;
                self.state = GameState::Waiting;
                self.events.push(SequenceEvent::LightsOut { at: due });
                debug!(?due, "lights out");
            }
        }
    }

    fn roll_hold(&mut self, last_lamp_at: Duration) {
        let hold = self.draw_hold();
        let lights_out_due = last_lamp_at.saturating_add(hold);
        self.run.hold = Some(hold);
        self.run.scheduled_lights_out = Some(lights_out_due);
        self.scheduler.schedule_at(lights_out_due, SequenceStep::LightsOut);
        self.events.push(SequenceEvent::HoldRolled {
            hold,
            lights_out_due,
        });
        trace!(?hold, "hold rolled");
    }

    fn draw_hold(&mut self) -> Duration {
        let (min, max) = (self.config.hold_min, self.config.hold_max);
        if min >= max {
            return min;
        }
        Duration::from_secs_f64(self.rng.gen_range(min.as_secs_f64()..max.as_secs_f64()))
    }

    fn jump_start(&mut self, now: Duration) -> TriggerOutcome {
        self.run.terminal_taken = true;
        self.scheduler.cancel_all();

        let offset = match self.run.scheduled_lights_out {
            Some(due) => secs_between(due, now),
            None => JUMP_START_SENTINEL,
        };
        let attempt = Attempt::jump_start(offset);
        self.run.active_lamps = 0;
        self.state = GameState::JumpStart;
        debug!(offset = attempt.reaction_time, "jump start");

        let verdict = Verdict {
            attempt,
            is_new_best: false,
            is_elite: false,
            celebration: CelebrationLevel::None,
        };
        self.settle(verdict.clone());
        TriggerOutcome::JumpStart(verdict)
    }

    fn react(&mut self, now: Duration) -> TriggerOutcome {
        let Some(lights_out) = self.run.lights_out_at else {
            return TriggerOutcome::Ignored;
        };
        self.run.terminal_taken = true;

        let reaction = secs_between(lights_out, now).max(MIN_REACTION_SECS);
        let is_new_best = self.ledger.best_time().map_or(true, |best| reaction < best);
        let is_elite = reaction < self.config.elite_threshold_secs;
        self.state = GameState::Result;
        debug!(reaction, is_new_best, is_elite, "reaction recorded");

        let verdict = Verdict {
            attempt: Attempt::new(reaction),
            is_new_best,
            is_elite,
            celebration: CelebrationLevel::for_result(reaction, is_new_best, is_elite),
        };
        self.settle(verdict.clone());
        TriggerOutcome::Reaction(verdict)
    }

    fn settle(&mut self, verdict: Verdict) {
        self.ledger.record(verdict.attempt.clone());
        self.last_verdict = Some(verdict);
    }
}
