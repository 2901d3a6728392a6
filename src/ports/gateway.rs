use std::collections::HashMap;
use std::future::Future;

use alloy_primitives::{Address, Bytes, B256};

use super::ledger::LedgerError;
use super::TxReceipt;

/// Ciphertext plus inclusion proof, produced for exactly one
/// (bid, submitter, context) triple and never reused across submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ciphertext: Bytes,
    pub proof: Bytes,
}

/// Outcome of a reveal: cleartext per requested handle, plus the receipt of
/// the finalize transaction that committed it to the ledger.
#[derive(Debug, Clone)]
pub struct DecryptionResult {
    pub clear_values: HashMap<B256, u64>,
    pub receipt: TxReceipt,
}

/// Port for the opaque FHE capability.
///
/// `encrypt` and `request_decryption` must not be called before a session
/// initialization has completed; initialization coalescing lives in
/// [`crate::session::FheSession`], not here.
///
/// Implementations:
/// - `MockFheGateway` (deterministic, for tests and the demo)
pub trait EncryptionGateway: Send + Sync {
    /// Initialize the capability for the current session. Safe to call when
    /// already initialized.
    fn initialize(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn is_initialized(&self) -> bool;

    /// Encrypt one plaintext integer for the given context and submitter.
    fn encrypt(
        &self,
        context: Address,
        submitter: Address,
        plaintext: u64,
    ) -> impl Future<Output = Result<EncryptedPayload, GatewayError>> + Send;

    /// Authenticate against the handles, obtain the proof-carrying cleartext
    /// bundle, and invoke `finalize` to commit it to the ledger before
    /// returning.
    ///
    /// A [`LedgerError::AlreadyVerified`] rejection from `finalize` must be
    /// surfaced as [`GatewayError::AlreadyVerified`]: callers treat it as a
    /// success path, not a fault.
    fn request_decryption<F, Fut>(
        &self,
        handles: Vec<B256>,
        context: Address,
        finalize: F,
    ) -> impl Future<Output = Result<DecryptionResult, GatewayError>> + Send
    where
        F: FnOnce(Bytes, Bytes) -> Fut + Send,
        Fut: Future<Output = Result<TxReceipt, LedgerError>> + Send;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Encryption capability not initialized for this session. Fatal for the
    /// current operation; never silently retried.
    #[error("encryption capability not initialized")]
    NotInitialized,

    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The ledger reports the handle was finalized concurrently by another
    /// actor. Non-fatal: triggers a registry refresh, never an error state.
    #[error("handle already verified on ledger")]
    AlreadyVerified,

    /// The finalize callback failed for a reason other than `AlreadyVerified`.
    #[error("finalize failed: {0}")]
    Finalize(#[from] LedgerError),
}
