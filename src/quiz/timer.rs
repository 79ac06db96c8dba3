//! Delayed transitions
//!
//! The question loop waits fixed delays between steps (to let feedback
//! be heard). Pending steps are kept here with their deadlines so they
//! can be dropped wholesale when the session changes.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one and hand another
/// to the orchestrator.
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// A step waiting on a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Start listening if auto-listen is still on
    AutoListen,
    /// Clear retry feedback and begin the next round
    ClearFeedback,
    /// Move on to the next question
    Advance,
}

/// Pending timer actions ordered by deadline
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<(Instant, TimerAction)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `when` has passed
    pub fn schedule(&mut self, when: Instant, action: TimerAction) {
        // Keep sorted by deadline; equal deadlines stay in insertion order
        let pos = self.pending.partition_point(|(at, _)| *at <= when);
        self.pending.insert(pos, (when, action));
    }

    /// Drop every pending action
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Take the earliest action that is due at `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerAction> {
        match self.pending.first() {
            Some((when, _)) if *when <= now => Some(self.pending.remove(0).1),
            _ => None,
        }
    }

    /// Time until the next deadline, zero if one is already due
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.pending
            .first()
            .map(|(when, _)| when.saturating_duration_since(now))
    }

    pub fn contains(&self, action: TimerAction) -> bool {
        self.pending.iter().any(|(_, a)| *a == action)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
