use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::stats::{self, Summary};
use crate::store::HistoryStore;

pub const DEFAULT_CAPACITY: usize = 50;

/// Reaction recorded when the player jumps before the hold was even rolled
pub const JUMP_START_SENTINEL: f64 = -1.0;

/// One completed cycle. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    /// Seconds; positive for a valid reaction, non-positive for a jump start
    pub reaction_time: f64,
    pub created_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(reaction_time: f64) -> Self {
        Self {
            id: format!("{:032x}", rand::random::<u128>()),
            reaction_time,
            created_at: Utc::now(),
        }
    }

    /// A jump start; positive offsets are clamped so the record stays non-positive
    pub fn jump_start(offset_secs: f64) -> Self {
        Self::new(offset_secs.min(0.0))
    }

    pub fn is_valid(&self) -> bool {
        self.reaction_time > 0.0
    }

    pub fn is_jump_start(&self) -> bool {
        !self.is_valid()
    }
}

/// Newest-first attempts, bounded to a fixed capacity
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    attempts: VecDeque<Attempt>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            attempts: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a history from newest-first attempts, keeping only the newest `capacity`
    pub fn from_attempts(attempts: Vec<Attempt>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        history
            .attempts
            .extend(attempts.into_iter().take(history.capacity));
        history
    }

    /// Prepends `attempt`, evicting the oldest entries beyond capacity
    pub fn record(&mut self, attempt: Attempt) {
        self.attempts.push_front(attempt);
        self.attempts.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.attempts.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn latest(&self) -> Option<&Attempt> {
        self.attempts.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.iter()
    }

    pub fn to_vec(&self) -> Vec<Attempt> {
        self.attempts.iter().cloned().collect()
    }

    pub fn valid_times(&self) -> Vec<f64> {
        self.attempts
            .iter()
            .filter(|a| a.is_valid())
            .map(|a| a.reaction_time)
            .collect()
    }

    /// Fastest valid reaction, if any
    pub fn best_time(&self) -> Option<f64> {
        self.attempts
            .iter()
            .filter(|a| a.is_valid())
            .map(|a| a.reaction_time)
            .reduce(f64::min)
    }

    /// Mean of the valid reactions, if any
    pub fn average(&self) -> Option<f64> {
        stats::mean(&self.valid_times())
    }

    /// The `n` fastest valid attempts, fastest first
    pub fn top_times(&self, n: usize) -> Vec<&Attempt> {
        self.attempts
            .iter()
            .filter(|a| a.is_valid())
            .sorted_by(|a, b| a.reaction_time.total_cmp(&b.reaction_time))
            .take(n)
            .collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Sole owner of the attempt history; mirrors every change into its store.
///
/// Store failures never reach the game: an unreadable history starts empty
/// and a failed save is logged and retried on the next change.
#[derive(Debug)]
pub struct HistoryLedger<S> {
    history: History,
    store: S,
}

impl<S: HistoryStore> HistoryLedger<S> {
    pub fn open(store: S, capacity: usize) -> Self {
        let history = match store.load() {
            Ok(Some(attempts)) => {
                debug!(count = attempts.len(), "loaded attempt history");
                History::from_attempts(attempts, capacity)
            }
            Ok(None) => History::new(capacity),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable attempt history");
                History::new(capacity)
            }
        };
        Self { history, store }
    }

    pub fn record(&mut self, attempt: Attempt) {
        self.history.record(attempt);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.persist();
    }

    pub fn best_time(&self) -> Option<f64> {
        self.history.best_time()
    }

    pub fn average(&self) -> Option<f64> {
        self.history.average()
    }

    pub fn summary(&self) -> Summary {
        stats::summarize(&self.history)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.history.to_vec()) {
            warn!(error = %e, "failed to save attempt history");
        }
    }
}
