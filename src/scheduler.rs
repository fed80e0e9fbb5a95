//! Timer scheduling for the key processor
//!
//! The processor never sleeps or spawns threads. It asks a [`Scheduler`] to
//! remember deadlines and the host polls expired timers back out, either on
//! a real clock ([`SystemClock`]) or a manually driven one ([`VirtualClock`],
//! used by tests and script replay).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

/// Handle for a scheduled timer, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Injected timer capability
///
/// Times are offsets from the scheduler's own epoch.
pub trait Scheduler<T> {
    /// Current time since the scheduler's epoch
    fn now(&self) -> Duration;

    /// Schedule `payload` to expire after `delay`
    fn schedule(&mut self, delay: Duration, payload: T) -> TimerId;

    /// Cancel a timer. Returns false if it already fired or never existed.
    fn cancel(&mut self, id: TimerId) -> bool;

    /// Remove and return the earliest timer whose deadline has passed
    fn pop_expired(&mut self) -> Option<(TimerId, T)>;

    /// Deadline of the earliest pending timer
    fn next_deadline(&self) -> Option<Duration>;

    /// Number of pending timers
    fn pending(&self) -> usize;
}

/// Deadline-ordered timer storage shared by both clocks
///
/// Timers with equal deadlines expire in scheduling order.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), T>,
    deadlines: HashMap<TimerId, Duration>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn schedule_at(&mut self, deadline: Duration, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((deadline, id), payload);
        self.deadlines.insert(id, deadline);
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.queue.remove(&(deadline, id))
    }

    /// Pop the earliest timer if its deadline is at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, T)> {
        let (&(deadline, _), _) = self.queue.first_key_value()?;
        if deadline > now {
            return None;
        }
        let ((_, id), payload) = self.queue.pop_first()?;
        self.deadlines.remove(&id);
        Some((id, payload))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.first_key_value().map(|(&(deadline, _), _)| deadline)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Clone)]
pub struct VirtualClock<T> {
    now: Duration,
    queue: TimerQueue<T>,
}

impl<T> Default for VirtualClock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VirtualClock<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            queue: TimerQueue::new(),
        }
    }

    /// Move the clock to `now`. Moving backwards is ignored.
    pub fn set_now(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Move the clock forward without firing anything
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl<T> Scheduler<T> for VirtualClock<T> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, payload: T) -> TimerId {
        self.queue.schedule_at(self.now + delay, payload)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.cancel(id).is_some()
    }

    fn pop_expired(&mut self) -> Option<(TimerId, T)> {
        self.queue.pop_due(self.now)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Wall-clock scheduler measured from its creation
///
/// Hosts sleep until [`Scheduler::next_deadline`] and then drain
/// [`Scheduler::pop_expired`] (via `KeyProcessor::run_due_timers`).
#[derive(Debug, Clone)]
pub struct SystemClock<T> {
    start: Instant,
    queue: TimerQueue<T>,
}

impl<T> Default for SystemClock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SystemClock<T> {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            queue: TimerQueue::new(),
        }
    }

    /// Time left until the next deadline, zero if already due
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = self.queue.next_deadline()?;
        Some(deadline.saturating_sub(self.start.elapsed()))
    }
}

impl<T> Scheduler<T> for SystemClock<T> {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn schedule(&mut self, delay: Duration, payload: T) -> TimerId {
        let deadline = self.now() + delay;
        self.queue.schedule_at(deadline, payload)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.cancel(id).is_some()
    }

    fn pop_expired(&mut self) -> Option<(TimerId, T)> {
        let now = self.now();
        self.queue.pop_due(now)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}
