use serde::{Deserialize, Serialize};

use crate::domain::record::BidRecord;

/// Aggregate view over all cached bid records.
///
/// Always recomputed wholesale from a full record set — never patched
/// incrementally — so a partially failed refresh cannot leave the numbers
/// drifting from the records they describe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_count: usize,
    /// Records not yet verified (bids still sealed).
    pub active_count: usize,
    /// Sum of the public bid amounts over all cached records.
    pub total_volume: u64,
    /// `total_volume / total_count`, 0 when there are no records.
    pub average_bid: f64,
}

impl AggregateStats {
    pub fn compute(records: &[BidRecord]) -> Self {
        let total_count = records.len();
        let active_count = records.iter().filter(|r| !r.is_verified).count();
        let total_volume: u64 = records.iter().map(|r| r.public_value1).sum();
        let average_bid = if total_count > 0 {
            total_volume as f64 / total_count as f64
        } else {
            0.0
        };
        Self {
            total_count,
            active_count,
            total_volume,
            average_bid,
        }
    }
}
