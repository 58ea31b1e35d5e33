//! Call-rate limiters: a throttle and a Tokio-driven debouncer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

// ============================================================================
// Throttle
// ============================================================================

/// Runs the wrapped function at most once per `limit`. Calls that land
/// inside the window are dropped, not deferred.
pub struct Throttle<F> {
    f: F,
    limit: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl<F> Throttle<F> {
    pub fn new(limit: Duration, f: F) -> Self {
        Self {
            f,
            limit,
            last_run: Mutex::new(None),
        }
    }

    /// Returns whether `f` ran.
    pub fn call<A>(&self, arg: A) -> bool
    where
        F: Fn(A),
    {
        {
            let mut last_run = self.last_run.lock();
            let now = Instant::now();
            if last_run.is_some_and(|at| now.duration_since(at) < self.limit) {
                return false;
            }
            *last_run = Some(now);
        }
        (self.f)(arg);
        true
    }
}

// ============================================================================
// Debouncer
// ============================================================================

/// Delays the wrapped function until `delay` has passed without another
/// call; only the last argument of a burst is delivered.
///
/// `call` spawns onto the current Tokio runtime and panics outside one.
pub struct Debouncer<A> {
    f: Arc<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new(delay: Duration, f: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            f: Arc::new(f),
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Cancel any scheduled run and schedule `arg` after the delay.
    pub fn call(&self, arg: A) {
        let f = Arc::clone(&self.f);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f(arg);
        });
        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    /// Drop the scheduled run, if any.
    pub fn cancel(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl<A> Drop for Debouncer<A> {
    fn drop(&mut self) {
        if let Some(task) = self.pending.get_mut().take() {
            task.abort();
        }
    }
}
