//! Cooperative stop signal for playback.
//!
//! A `StopToken` is shared between the scheduler and whoever may end the run
//! early (a Ctrl-C handler, a supervising thread). Stopping wakes any thread
//! blocked in `wait_timeout`, so a pacing wait never outlives a stop request.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Default)]
pub struct StopToken {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        let mut stopped = self.lock();
        *stopped = true;
        self.inner.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.lock()
    }

    /// Block for up to `timeout`, returning early if the token is stopped.
    ///
    /// Returns `true` when the wait ended because of a stop request. A
    /// timeout past the end of the `Instant` range waits until stopped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait_until_stopped();
        };
        let mut stopped = self.lock();
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            stopped = match self.inner.wake.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    fn wait_until_stopped(&self) -> bool {
        let mut stopped = self.lock();
        while !*stopped {
            stopped = self
                .inner
                .wake
                .wait(stopped)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        true
    }

    // A poisoned flag is still a valid bool; recover it rather than panic.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
