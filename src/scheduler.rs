use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use tracing::trace;

use crate::clock::Clock;

/// Identifies one scheduled action and the run generation it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    generation: u64,
    seq: u64,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// An action whose deadline has passed and that is still live
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<A> {
    pub handle: TimerHandle,
    pub due: Duration,
    pub action: A,
}

#[derive(Debug)]
struct Pending<A> {
    due: Duration,
    handle: TimerHandle,
    action: A,
}

impl<A> PartialEq for Pending<A> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.handle.seq == other.handle.seq
    }
}

impl<A> Eq for Pending<A> {}

impl<A> PartialOrd for Pending<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the earliest deadline; equal deadlines pop in
// scheduling order.
impl<A> Ord for Pending<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.handle.seq.cmp(&self.handle.seq))
    }
}

/// Owns the delayed actions of one sequence run.
///
/// Actions are tagged with the generation current when they were scheduled.
/// `cancel_all` moves to a new generation, and `poll_due` re-checks the tag of
/// every entry at the moment it would run, so nothing scheduled before a
/// cancellation can ever execute after it.
#[derive(Debug)]
pub struct Scheduler<C, A> {
    clock: C,
    generation: u64,
    next_seq: u64,
    issued_since_cancel: bool,
    queue: BinaryHeap<Pending<A>>,
}

impl<C: Clock, A> Scheduler<C, A> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            generation: 0,
            next_seq: 0,
            issued_since_cancel: false,
            queue: BinaryHeap::new(),
        }
    }

    /// Arms `action` to run `delay` after the current clock reading
    pub fn schedule(&mut self, delay: Duration, action: A) -> TimerHandle {
        let due = self.clock.now().saturating_add(delay);
        self.schedule_at(due, action)
    }

    /// Arms `action` for an absolute deadline on the scheduler's clock.
    ///
    /// Chained steps use this to count from when their predecessor was due
    /// rather than from when it happened to be polled.
    pub fn schedule_at(&mut self, due: Duration, action: A) -> TimerHandle {
        let handle = TimerHandle {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.issued_since_cancel = true;

        trace!(seq = handle.seq, generation = handle.generation, ?due, "timer armed");
        self.queue.push(Pending {
            due,
            handle,
            action,
        });
        handle
    }

    /// Cancels every handle issued since the previous call. Idempotent.
    ///
    /// Cancelled entries stay queued until their deadline and are discarded by
    /// `poll_due` when they surface.
    pub fn cancel_all(&mut self) {
        if self.issued_since_cancel {
            self.generation += 1;
            self.issued_since_cancel = false;
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `handle` belongs to the current generation
    pub fn is_current(&self, handle: TimerHandle) -> bool {
        handle.generation == self.generation
    }

    /// Number of live actions still waiting for their deadline
    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|p| p.handle.generation == self.generation)
            .count()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue
            .iter()
            .filter(|p| p.handle.generation == self.generation)
            .map(|p| p.due)
            .min()
    }

    /// Pops the earliest live action whose deadline is at or before now
    pub fn poll_due(&mut self) -> Option<Fired<A>> {
        let now = self.clock.now();
        while self.queue.peek().is_some_and(|p| p.due <= now) {
            let entry = self.queue.pop()?;
            if !self.is_current(entry.handle) {
                trace!(seq = entry.handle.seq, "dropping stale timer");
                continue;
            }
            return Some(Fired {
                handle: entry.handle,
                due: entry.due,
                action: entry.action,
            });
        }
        None
    }
}
