use std::future::Future;

use alloy_primitives::{Bytes, B256};

use super::PendingTx;
use crate::domain::{BidId, BidRecord, BidSubmission};

/// Port for the external auction registry (contract + RPC).
///
/// Reads never mutate state and need no signing capability. Writes require a
/// signing-capable session and return a [`PendingTx`] that must be confirmed
/// before the effect is treated as durable. No call is retried automatically.
///
/// Implementations:
/// - `MockLedger` (in-memory, for tests and the demo)
pub trait LedgerPort: Send + Sync {
    /// Enumerate all known bid record ids.
    fn list_record_ids(&self) -> impl Future<Output = Result<Vec<BidId>, LedgerError>> + Send;

    /// Fetch one bid record.
    fn get_record(&self, id: &BidId)
        -> impl Future<Output = Result<BidRecord, LedgerError>> + Send;

    /// Fetch the opaque ciphertext handle for a record's encrypted bid.
    fn get_encrypted_handle(
        &self,
        id: &BidId,
    ) -> impl Future<Output = Result<B256, LedgerError>> + Send;

    /// Submit a new encrypted bid record.
    fn submit_record(
        &self,
        submission: &BidSubmission,
    ) -> impl Future<Output = Result<PendingTx, LedgerError>> + Send;

    /// Finalize a reveal: commit ABI-encoded clear values plus the decryption
    /// proof for an existing record. Rejects with [`LedgerError::AlreadyVerified`]
    /// when another actor finalized the record first.
    fn submit_decryption_proof(
        &self,
        id: &BidId,
        clear_values: &Bytes,
        proof: &Bytes,
    ) -> impl Future<Output = Result<PendingTx, LedgerError>> + Send;

    /// Registry liveness probe.
    fn is_available(&self) -> impl Future<Output = Result<bool, LedgerError>> + Send;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    /// The signer declined. Expected and benign; reported without alarm.
    #[error("transaction rejected by signer")]
    UserRejected,

    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// The record was finalized concurrently by another actor. Not a fault:
    /// callers treat this as success-with-no-value and refresh.
    #[error("record already verified on ledger")]
    AlreadyVerified,

    #[error("record not found: {0}")]
    RecordNotFound(BidId),

    #[error("rpc error: {0}")]
    Rpc(String),
}
