//! Injectable time source for the playback scheduler.
//!
//! The scheduler never calls `Instant::now()` or `thread::sleep` directly.
//! It measures consumer latency and waits out the pacing budget through a
//! `Clock`, so tests can drive playback with simulated time.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::stop::StopToken;

/// How a pacing wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Stopped,
}

pub trait Clock {
    /// Monotonic time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Block for `timeout`, or less if `stop` is triggered first.
    fn wait(&self, timeout: Duration, stop: &StopToken) -> WaitOutcome;
}

/// Wall-clock time backed by `Instant`.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wait(&self, timeout: Duration, stop: &StopToken) -> WaitOutcome {
        if stop.wait_timeout(timeout) {
            WaitOutcome::Stopped
        } else {
            WaitOutcome::Elapsed
        }
    }
}

/// Simulated time. Only moves when advanced or waited on.
///
/// Clones share the same timeline, so a test consumer holding a clone can
/// simulate processing latency with `advance`.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    waits: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.now = state.now.saturating_add(by);
    }

    /// Every wait requested so far, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.lock().waits.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn wait(&self, timeout: Duration, stop: &StopToken) -> WaitOutcome {
        let mut state = self.lock();
        state.waits.push(timeout);
        if stop.is_stopped() {
            return WaitOutcome::Stopped;
        }
        state.now = state.now.saturating_add(timeout);
        WaitOutcome::Elapsed
    }
}
