//! Consumed boundaries of the orchestrator, expressed as traits.
//!
//! The auction registry contract, the FHE capability, and the wallet session
//! are external collaborators; these ports define exactly what the lifecycle
//! logic needs from each of them.

pub mod gateway;
pub mod ledger;
pub mod wallet;

use alloy_primitives::B256;

use self::ledger::LedgerError;
use tokio::sync::oneshot;

/// Minimal transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub success: bool,
}

/// A submitted-but-unconfirmed ledger write.
///
/// The write is not durable until [`PendingTx::confirm`] resolves; callers
/// must await confirmation before acting on the effect.
#[derive(Debug)]
pub struct PendingTx {
    tx_hash: B256,
    rx: oneshot::Receiver<Result<TxReceipt, LedgerError>>,
}

impl PendingTx {
    /// Create a pending transaction and the sender its issuer resolves it with.
    pub fn channel(tx_hash: B256) -> (oneshot::Sender<Result<TxReceipt, LedgerError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { tx_hash, rx })
    }

    /// An already-confirmed transaction (mock adapters confirm instantly).
    pub fn confirmed(receipt: TxReceipt) -> Self {
        let (tx, pending) = Self::channel(receipt.tx_hash);
        let _ = tx.send(Ok(receipt));
        pending
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Await inclusion. Resolves to the receipt, or the ledger's rejection.
    pub async fn confirm(self) -> Result<TxReceipt, LedgerError> {
        match self.rx.await {
            Ok(result) => result,
            // Issuer dropped the sender without resolving.
            Err(_) => Err(LedgerError::SubmissionFailed(
                "transaction abandoned before confirmation".into(),
            )),
        }
    }
}
