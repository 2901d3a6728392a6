//! Pure auction data types and derivations. No I/O here; everything that
//! touches the ledger or the FHE capability lives behind `ports`.

pub mod history;
pub mod record;
pub mod stats;

pub use history::{BidHistoryEntry, BidStatus};
pub use record::{BidAmount, BidId, BidRecord, BidSubmission};
pub use stats::AggregateStats;
