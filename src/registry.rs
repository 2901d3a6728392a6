//! In-memory cache of ledger bid records plus derived statistics and history.
//!
//! The registry is the single shared mutable structure of the system. All
//! mutation goes through [`BidRegistry::refresh`], which is a full
//! resynchronization: ids are re-enumerated, every record re-fetched, stats
//! recomputed wholesale. Readers take an owned snapshot and never observe a
//! half-applied refresh.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{AggregateStats, BidHistoryEntry, BidId, BidRecord};
use crate::ports::ledger::{LedgerError, LedgerPort};
use crate::singleflight::{self, Flight, SingleFlight};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Owned point-in-time view of the registry.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub records: Vec<BidRecord>,
    pub stats: AggregateStats,
    pub history: Vec<BidHistoryEntry>,
}

impl RegistrySnapshot {
    pub fn record(&self, id: &BidId) -> Option<&BidRecord> {
        self.records.iter().find(|r| &r.id == id)
    }
}

#[derive(Default)]
struct RegistryState {
    records: Vec<BidRecord>,
    stats: AggregateStats,
    history: Vec<BidHistoryEntry>,
}

/// Cache of all known bid records; source of truth for the query layer.
pub struct BidRegistry<L: LedgerPort> {
    ledger: Arc<L>,
    state: Mutex<RegistryState>,
    refresh_flight: SingleFlight,
}

impl<L: LedgerPort> BidRegistry<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            state: Mutex::new(RegistryState::default()),
            refresh_flight: SingleFlight::new(),
        }
    }

    /// Fully resynchronize the cache with the ledger.
    ///
    /// At most one refresh is in flight; a caller arriving while one runs is
    /// satisfied by that refresh instead of issuing a second fetch storm.
    /// A record that fails to fetch is logged and skipped; one malformed
    /// record never aborts the whole refresh.
    pub async fn refresh(&self) -> Result<(), RegistryError> {
        match self.refresh_flight.begin() {
            Flight::Joined(rx) => {
                debug!("refresh already in flight, coalescing");
                singleflight::join(rx).await;
                Ok(())
            }
            Flight::Leader(guard) => {
                let result = self.refresh_inner().await;
                drop(guard);
                result
            }
        }
    }

    async fn refresh_inner(&self) -> Result<(), RegistryError> {
        let ids = self.ledger.list_record_ids().await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.ledger.get_record(id).await {
                Ok(record) => records.push(record),
                // Partial success is acceptable; skip the bad record.
                Err(e) => warn!(record = %id, error = %e, "skipping unreadable record"),
            }
        }

        let stats = AggregateStats::compute(&records);
        let entries: Vec<BidHistoryEntry> =
            records.iter().map(BidHistoryEntry::from_record).collect();

        let mut state = self.state.lock().await;
        state.records = records;
        state.stats = stats;
        // History is append-only across refreshes; duplicates are intended.
        state.history.extend(entries);
        debug!(
            records = state.records.len(),
            history = state.history.len(),
            "registry refreshed"
        );
        Ok(())
    }

    /// Pure read of the current cache. No side effects.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.lock().await;
        RegistrySnapshot {
            records: state.records.clone(),
            stats: state.stats.clone(),
            history: state.history.clone(),
        }
    }
}
