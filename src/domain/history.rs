use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::domain::record::{BidId, BidRecord};

/// Verification status of a bid at the time a history entry was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidStatus {
    Pending,
    Verified,
}

/// Append-only audit entry, one per record per successful registry refresh.
///
/// Entries are never mutated or deduplicated: the same record appearing in
/// two refreshes produces two entries. Duplicates are an accepted cache
/// artifact, not a correctness violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidHistoryEntry {
    pub record_id: BidId,
    pub bidder: Address,
    pub timestamp: u64,
    pub amount: u64,
    pub status: BidStatus,
}

impl BidHistoryEntry {
    pub fn from_record(record: &BidRecord) -> Self {
        Self {
            record_id: record.id.clone(),
            bidder: record.creator,
            timestamp: record.timestamp,
            amount: record.public_value1,
            status: if record.is_verified {
                BidStatus::Verified
            } else {
                BidStatus::Pending
            },
        }
    }
}
