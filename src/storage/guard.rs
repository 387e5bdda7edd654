//! RAII handle for a held entity lock.

use std::fmt;

type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

/// A held lock. Releasing happens exactly once, either through
/// [`LockGuard::release`] or when the guard is dropped.
///
/// # Example
///
/// ```rust
/// use lockstep::storage::LockGuard;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let releases = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&releases);
/// let guard = LockGuard::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// guard.release();
/// assert_eq!(releases.load(Ordering::SeqCst), 1);
/// ```
pub struct LockGuard {
    release: Option<ReleaseFn>,
}

impl LockGuard {
    /// Wrap the action that gives the lock back.
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release. Useful for storage that does not
    /// need real exclusion, and for tests.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Release the lock now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("held", &self.release.is_some())
            .finish()
    }
}
