use std::time::Duration;

use crate::engine::GameState;

/// Why the gate let a trigger through or not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accepted,
    Debounced,
    CoolingDown,
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted)
    }
}

/// Filters raw triggers before they reach the sequence engine.
///
/// Near-duplicate triggers inside the debounce window are always dropped.
/// While a result is on screen, triggers are also dropped until the result
/// cooldown has passed since the last accepted trigger.
#[derive(Debug, Clone)]
pub struct InputGate {
    debounce: Duration,
    result_cooldown: Duration,
    last_accepted: Option<Duration>,
}

impl InputGate {
    pub fn new(debounce: Duration, result_cooldown: Duration) -> Self {
        Self {
            debounce,
            result_cooldown,
            last_accepted: None,
        }
    }

    pub fn check(&mut self, now: Duration, state: GameState) -> GateDecision {
        if let Some(last) = self.last_accepted {
            let since = now.saturating_sub(last);
            if since < self.debounce {
                return GateDecision::Debounced;
            }
            if state.is_settled() && since < self.result_cooldown {
                return GateDecision::CoolingDown;
            }
        }
        self.last_accepted = Some(now);
        GateDecision::Accepted
    }

    pub fn accept(&mut self, now: Duration, state: GameState) -> bool {
        self.check(now, state).is_accepted()
    }

    pub fn last_accepted(&self) -> Option<Duration> {
        self.last_accepted
    }
}
