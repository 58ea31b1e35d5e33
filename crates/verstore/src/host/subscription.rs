//! RAII guard for listener registrations.

use std::fmt;

use parking_lot::Mutex;

type Release = Box<dyn FnOnce() + Send>;

/// Keeps a listener registered. Dropping the guard releases it.
///
/// Releasing is idempotent: an explicit [`Subscription::unsubscribe`]
/// followed by the drop runs the release closure once.
#[must_use = "dropping a Subscription immediately unregisters the listener"]
pub struct Subscription {
    release: Mutex<Option<Release>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// A guard with nothing to release.
    pub fn noop() -> Self {
        Self {
            release: Mutex::new(None),
        }
    }

    /// Release the registration now.
    pub fn unsubscribe(&self) {
        // Take under the lock, run outside it.
        let release = self.release.lock().take();
        if let Some(f) = release {
            f();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.lock().is_some()
    }

    /// Convert into a boxed closure, for callers that hand the release to
    /// foreign code.
    pub fn into_fn(self) -> Box<dyn FnOnce() + Send> {
        Box::new(move || self.unsubscribe())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.release.get_mut().take() {
            f();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
