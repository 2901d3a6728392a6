//! Single-flight guard: duplicate concurrent requests for the same operation
//! coalesce into one in-flight execution instead of duplicating work.
//!
//! Two call sites use this:
//! - registry refresh: joiners wait for the in-flight refresh to finish;
//! - FHE session init: duplicate connect events are dropped while one runs.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

/// Outcome of [`SingleFlight::begin`].
pub enum Flight {
    /// This caller leads the operation. Completion is published when the
    /// guard is dropped.
    Leader(FlightGuard),
    /// An execution is already in flight. The receiver resolves when the
    /// leader finishes; callers may also discard it to drop the duplicate.
    Joined(watch::Receiver<bool>),
}

/// Coalescing point for one logical operation.
pub struct SingleFlight {
    slot: Arc<Mutex<Option<watch::Receiver<bool>>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Begin (or join) the operation.
    pub fn begin(&self) -> Flight {
        let mut slot = lock(&self.slot);
        if let Some(rx) = slot.as_ref() {
            return Flight::Joined(rx.clone());
        }
        let (tx, rx) = watch::channel(false);
        *slot = Some(rx);
        Flight::Leader(FlightGuard {
            slot: Arc::clone(&self.slot),
            tx,
        })
    }

    /// Whether an execution is currently in flight.
    pub fn in_flight(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by the leader for the duration of the operation. Dropping it clears
/// the in-flight slot and wakes all joiners, on success and failure alike.
pub struct FlightGuard {
    slot: Arc<Mutex<Option<watch::Receiver<bool>>>>,
    tx: watch::Sender<bool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        *lock(&self.slot) = None;
        let _ = self.tx.send(true);
    }
}

/// Wait for the in-flight execution a [`Flight::Joined`] receiver refers to.
pub async fn join(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        // Sender dropped also means the leader finished.
        if rx.changed().await.is_err() {
            break;
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // The slot is only touched in short non-async critical sections; a
    // poisoned lock can only mean a panic mid-update, so take the inner value.
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn leader_runs_joiners_wait() {
        let flight = Arc::new(SingleFlight::new());
        let runs = Arc::new(AtomicU32::new(0));

        let guard = match flight.begin() {
            Flight::Leader(g) => g,
            Flight::Joined(_) => panic!("first caller must lead"),
        };
        runs.fetch_add(1, Ordering::SeqCst);

        let joined = match flight.begin() {
            Flight::Joined(rx) => rx,
            Flight::Leader(_) => panic!("second caller must join"),
        };

        let waiter = tokio::spawn(join(joined));
        drop(guard);
        waiter.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!flight.in_flight());
    }

    #[tokio::test]
    async fn slot_clears_after_completion() {
        let flight = SingleFlight::new();

        let guard = match flight.begin() {
            Flight::Leader(g) => g,
            Flight::Joined(_) => panic!("expected leader"),
        };
        assert!(flight.in_flight());
        drop(guard);

        // A new caller leads again.
        assert!(matches!(flight.begin(), Flight::Leader(_)));
    }

    #[tokio::test]
    async fn join_resolves_even_if_already_done() {
        let flight = SingleFlight::new();
        let rx = {
            let guard = match flight.begin() {
                Flight::Leader(g) => g,
                Flight::Joined(_) => panic!("expected leader"),
            };
            let rx = match flight.begin() {
                Flight::Joined(rx) => rx,
                Flight::Leader(_) => panic!("expected joiner"),
            };
            drop(guard);
            rx
        };
        // Leader already finished; join must not hang.
        join(rx).await;
    }
}
