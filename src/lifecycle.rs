//! The bid lifecycle state machine.
//!
//! Drives a single bid through creation → encryption → submission → verified
//! reveal, enforcing ordering and idempotence. Suspension happens only at
//! calls into the gateway and ledger ports; registry state is read as a
//! snapshot and re-derived by a refresh after every terminal transition, so
//! no lock is held across a suspending call.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::Address;
use tracing::{info, warn};

use crate::domain::{BidAmount, BidId, BidRecord, BidSubmission};
use crate::ports::gateway::{EncryptionGateway, GatewayError};
use crate::ports::ledger::{LedgerError, LedgerPort};
use crate::ports::wallet::WalletSession;
use crate::registry::{BidRegistry, RegistryError};
use crate::session::{FheSession, InitOutcome};
use crate::status::StatusReporter;

/// Typed command for placing a bid. Amount validation happens at
/// construction, not inside the state machine.
#[derive(Debug, Clone)]
pub struct PlaceBid {
    pub name: String,
    pub amount: BidAmount,
    pub description: String,
}

impl PlaceBid {
    pub fn new(name: impl Into<String>, amount: BidAmount, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            description: description.into(),
        }
    }

    /// Parse user-entered amount text at the boundary (truncating fractional
    /// input to whole bid units).
    pub fn parse(
        name: impl Into<String>,
        amount: &str,
        description: impl Into<String>,
    ) -> Result<Self, LifecycleError> {
        let amount = amount
            .parse::<BidAmount>()
            .map_err(LifecycleError::InvalidAmount)?;
        Ok(Self::new(name, amount, description))
    }
}

/// Creation-path states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    Idle,
    Encrypting,
    Submitting,
    AwaitingConfirmation,
    Complete,
    Failed(String),
}

/// Reveal sub-path states, orthogonal to the creation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    RevealRequested,
    RevealConfirmed,
    /// Another actor finalized first; resolved by refresh, not an error.
    AlreadyVerified,
    Failed(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LifecycleError {
    /// No identity session; checked before any mutating call.
    #[error("wallet not connected")]
    NotConnected,

    #[error("invalid bid amount: {0}")]
    InvalidAmount(String),

    #[error("record not found in registry: {0}")]
    RecordNotFound(BidId),

    /// The submission confirmed but the refreshed registry does not show the
    /// record; the bid is not considered to exist.
    #[error("record not visible after refresh: {0}")]
    RecordNotVisible(BidId),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Orchestrates bids over the ledger, gateway, wallet and registry.
pub struct BidLifecycleController<L, G, W>
where
    L: LedgerPort,
    G: EncryptionGateway,
    W: WalletSession,
{
    ledger: Arc<L>,
    session: Arc<FheSession<G>>,
    wallet: Arc<W>,
    registry: Arc<BidRegistry<L>>,
    status: StatusReporter,
    /// Auction contract address, the encryption context for every bid.
    context: Address,
    phase: Mutex<LifecyclePhase>,
    reveal_phase: Mutex<RevealPhase>,
}

impl<L, G, W> BidLifecycleController<L, G, W>
where
    L: LedgerPort,
    G: EncryptionGateway,
    W: WalletSession,
{
    pub fn new(
        ledger: Arc<L>,
        session: Arc<FheSession<G>>,
        wallet: Arc<W>,
        registry: Arc<BidRegistry<L>>,
        status: StatusReporter,
        context: Address,
    ) -> Self {
        Self {
            ledger,
            session,
            wallet,
            registry,
            status,
            context,
            phase: Mutex::new(LifecyclePhase::Idle),
            reveal_phase: Mutex::new(RevealPhase::Idle),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        lock(&self.phase).clone()
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn reveal_phase(&self) -> RevealPhase {
        lock(&self.reveal_phase).clone()
    }

    fn set_phase(&self, phase: LifecyclePhase) {
        *lock(&self.phase) = phase;
    }

    fn set_reveal_phase(&self, phase: RevealPhase) {
        *lock(&self.reveal_phase) = phase;
    }

    /// Handle a wallet connect event: lazily initialize the FHE session.
    /// Duplicate events while an initialization runs are dropped.
    pub async fn handle_connect(&self) -> Result<InitOutcome, LifecycleError> {
        if !self.wallet.is_connected() {
            return Err(LifecycleError::NotConnected);
        }
        match self.session.ensure_initialized().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.status.error("FHE initialization failed");
                Err(e.into())
            }
        }
    }

    /// Create, encrypt and submit a new bid.
    ///
    /// The bid only exists once the post-confirmation refresh observes it in
    /// a registry snapshot; that observed record is returned.
    pub async fn place_bid(&self, command: PlaceBid) -> Result<BidRecord, LifecycleError> {
        let submitter = match self.wallet.address() {
            Some(address) => address,
            None => {
                self.status.error("Please connect wallet first");
                return Err(LifecycleError::NotConnected);
            }
        };

        self.status
            .pending("Creating blind auction with FHE encryption...");

        let result = self.place_bid_inner(command, submitter).await;
        match &result {
            Ok(record) => {
                self.set_phase(LifecyclePhase::Complete);
                self.status.success("Blind bid placed successfully!");
                info!(id = %record.id, amount = record.public_value1, "bid placed");
            }
            Err(e) => {
                self.set_phase(LifecyclePhase::Failed(e.to_string()));
                self.report_submission_failure(e);
            }
        }
        result
    }

    async fn place_bid_inner(
        &self,
        command: PlaceBid,
        submitter: Address,
    ) -> Result<BidRecord, LifecycleError> {
        self.set_phase(LifecyclePhase::Encrypting);
        let payload = self
            .session
            .gateway()
            .encrypt(self.context, submitter, command.amount.units())
            .await?;

        let submission = BidSubmission {
            id: BidId::generate(),
            name: command.name,
            ciphertext: payload.ciphertext,
            proof: payload.proof,
            // Plaintext mirror kept for demo analytics; see BidRecord docs.
            public_value1: command.amount.units(),
            public_value2: 0,
            description: command.description,
            submitter,
        };

        self.set_phase(LifecyclePhase::Submitting);
        let pending = self.ledger.submit_record(&submission).await?;

        self.set_phase(LifecyclePhase::AwaitingConfirmation);
        self.status.pending("Encrypting bid and submitting...");
        pending.confirm().await?;

        // The authoritative copy now lives on the ledger; re-derive it.
        self.registry.refresh().await?;
        let snapshot = self.registry.snapshot().await;
        snapshot
            .record(&submission.id)
            .cloned()
            .ok_or(LifecycleError::RecordNotVisible(submission.id))
    }

    /// Reveal a bid's cleartext value.
    ///
    /// Already-verified records resolve from the snapshot with zero network
    /// calls. Losing a reveal race returns `Ok(None)`: the refresh surfaces
    /// the now-authoritative value and no error is reported.
    pub async fn reveal_bid(&self, id: &BidId) -> Result<Option<u64>, LifecycleError> {
        if !self.wallet.is_connected() {
            self.status.error("Please connect wallet first");
            return Err(LifecycleError::NotConnected);
        }

        let snapshot = self.registry.snapshot().await;
        let record = snapshot
            .record(id)
            .ok_or_else(|| LifecycleError::RecordNotFound(id.clone()))?;

        // Idempotent fast path: finalized cleartext is authoritative.
        if let Some(value) = record.revealed_value() {
            self.status.success("Bid already verified on-chain");
            return Ok(Some(value));
        }

        self.set_reveal_phase(RevealPhase::RevealRequested);
        self.status.pending("Verifying decryption...");

        let handle = self.ledger.get_encrypted_handle(id).await?;
        let ledger = Arc::clone(&self.ledger);
        let finalize_id = id.clone();

        let outcome = self
            .session
            .gateway()
            .request_decryption(vec![handle], self.context, move |clear_values, proof| {
                async move {
                    ledger
                        .submit_decryption_proof(&finalize_id, &clear_values, &proof)
                        .await?
                        .confirm()
                        .await
                }
            })
            .await;

        match outcome {
            Ok(result) => {
                let value = result.clear_values.get(&handle).copied().ok_or_else(|| {
                    GatewayError::DecryptionFailed(format!("no clear value for handle {handle}"))
                })?;
                self.registry.refresh().await?;
                self.set_reveal_phase(RevealPhase::RevealConfirmed);
                self.status.success("Bid decrypted and verified!");
                info!(id = %id, "bid revealed");
                Ok(Some(value))
            }
            Err(GatewayError::AlreadyVerified) => {
                // Lost the race; the winner's value becomes visible on refresh.
                self.set_reveal_phase(RevealPhase::AlreadyVerified);
                self.registry.refresh().await?;
                self.status.success("Bid already verified");
                info!(id = %id, "reveal raced, record already verified");
                Ok(None)
            }
            Err(e) => {
                self.set_reveal_phase(RevealPhase::Failed(e.to_string()));
                self.status.error("Decryption failed");
                warn!(id = %id, error = %e, "reveal failed");
                Err(e.into())
            }
        }
    }

    /// Probe registry liveness and report the result.
    pub async fn check_availability(&self) -> Result<bool, LifecycleError> {
        match self.ledger.is_available().await {
            Ok(available) => {
                let word = if available { "available" } else { "unavailable" };
                self.status.success(format!("Contract is {word}"));
                Ok(available)
            }
            Err(e) => {
                self.status.error("Availability check failed");
                Err(e.into())
            }
        }
    }

    fn report_submission_failure(&self, error: &LifecycleError) {
        match error {
            // Expected and benign; no alarm.
            LifecycleError::Ledger(LedgerError::UserRejected) => {
                self.status.error("Transaction rejected");
            }
            other => {
                self.status.error(format!("Submission failed: {other}"));
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
