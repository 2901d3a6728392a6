//! User-facing operation status.
//!
//! Collapses lifecycle events into a finite set of states. Success and Error
//! auto-revert to Idle after a fixed dwell; Pending persists until replaced.
//! Purely observational: nothing here blocks or retries an operation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Current user-facing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Pending(String),
    Success(String),
    Error(String),
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

struct Inner {
    state: Mutex<Status>,
    /// Bumped on every transition; an expiry task only reverts the state it
    /// was scheduled for, never a newer one.
    generation: AtomicU64,
    success_dwell: Duration,
    error_dwell: Duration,
}

/// Cloneable handle to the shared status state.
#[derive(Clone)]
pub struct StatusReporter {
    inner: Arc<Inner>,
}

impl StatusReporter {
    /// Default dwell times: success 2s, error 3s.
    pub fn new() -> Self {
        Self::with_dwell(Duration::from_secs(2), Duration::from_secs(3))
    }

    pub fn with_dwell(success_dwell: Duration, error_dwell: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Status::Idle),
                generation: AtomicU64::new(0),
                success_dwell,
                error_dwell,
            }),
        }
    }

    pub fn current(&self) -> Status {
        lock(&self.inner.state).clone()
    }

    /// Persists until replaced by another transition.
    pub fn pending(&self, message: impl Into<String>) {
        self.transition(Status::Pending(message.into()));
    }

    pub fn success(&self, message: impl Into<String>) {
        let generation = self.transition(Status::Success(message.into()));
        self.schedule_expiry(generation, self.inner.success_dwell);
    }

    pub fn error(&self, message: impl Into<String>) {
        let generation = self.transition(Status::Error(message.into()));
        self.schedule_expiry(generation, self.inner.error_dwell);
    }

    pub fn clear(&self) {
        self.transition(Status::Idle);
    }

    fn transition(&self, status: Status) -> u64 {
        let mut state = lock(&self.inner.state);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *state = status;
        generation
    }

    fn schedule_expiry(&self, generation: u64, dwell: Duration) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            // Only revert if no newer transition happened meanwhile.
            if inner.generation.load(Ordering::SeqCst) == generation {
                *lock(&inner.state) = Status::Idle;
            }
        });
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
