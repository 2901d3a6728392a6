use std::collections::{HashMap, HashSet};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{keccak256, Bytes, B256};
use tokio::sync::Mutex;

use crate::adapters::abi;
use crate::domain::{BidId, BidRecord, BidSubmission};
use crate::ports::ledger::{LedgerError, LedgerPort};
use crate::ports::{PendingTx, TxReceipt};

#[derive(Default)]
struct LedgerState {
    /// Insertion order, so `list_record_ids` enumerates deterministically.
    order: Vec<BidId>,
    records: HashMap<BidId, BidRecord>,
    /// Ciphertext handle per record: keccak256 of the submitted ciphertext.
    handles: HashMap<BidId, B256>,
    available: bool,

    // Failure injection
    fail_fetch: HashSet<BidId>,
    reject_next_submit: bool,
    fail_next_submit: Option<String>,
    list_delay: Option<Duration>,

    // Call counters for test assertions
    list_calls: u32,
    write_calls: u32,
    confirmed_proofs: u32,
}

/// In-memory implementation of [`LedgerPort`].
///
/// Confirms transactions instantly and supports per-call failure injection so
/// tests can exercise rejection, partial-fetch and reveal-race paths.
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                available: true,
                ..LedgerState::default()
            }),
        }
    }

    /// Make the next `get_record(id)` calls fail (persists until cleared).
    pub async fn fail_fetch_of(&self, id: BidId) {
        self.state.lock().await.fail_fetch.insert(id);
    }

    pub async fn clear_fetch_failures(&self) {
        self.state.lock().await.fail_fetch.clear();
    }

    /// The next write is declined by the signer.
    pub async fn reject_next_submit(&self) {
        self.state.lock().await.reject_next_submit = true;
    }

    /// The next write fails at the ledger with the given reason.
    pub async fn fail_next_submit(&self, reason: impl Into<String>) {
        self.state.lock().await.fail_next_submit = Some(reason.into());
    }

    /// Delay id enumeration, for refresh-coalescing tests.
    pub async fn set_list_delay(&self, delay: Duration) {
        self.state.lock().await.list_delay = Some(delay);
    }

    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    /// How many times record ids were enumerated.
    pub async fn list_calls(&self) -> u32 {
        self.state.lock().await.list_calls
    }

    /// How many write submissions were attempted (accepted or not).
    pub async fn write_calls(&self) -> u32 {
        self.state.lock().await.write_calls
    }

    /// How many decryption proofs reached confirmed state.
    pub async fn confirmed_proofs(&self) -> u32 {
        self.state.lock().await.confirmed_proofs
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn receipt_for(id: &BidId) -> TxReceipt {
    TxReceipt {
        tx_hash: keccak256(id.as_str().as_bytes()),
        success: true,
    }
}

impl LedgerPort for MockLedger {
    async fn list_record_ids(&self) -> Result<Vec<BidId>, LedgerError> {
        let delay = {
            let mut state = self.state.lock().await;
            state.list_calls += 1;
            state.list_delay
        };
        // Sleep outside the lock so concurrent callers are not serialized
        // by the mock itself.
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.state.lock().await.order.clone())
    }

    async fn get_record(&self, id: &BidId) -> Result<BidRecord, LedgerError> {
        let state = self.state.lock().await;
        if state.fail_fetch.contains(id) {
            return Err(LedgerError::Rpc(format!("fetch failed for {id}")));
        }
        state
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::RecordNotFound(id.clone()))
    }

    async fn get_encrypted_handle(&self, id: &BidId) -> Result<B256, LedgerError> {
        self.state
            .lock()
            .await
            .handles
            .get(id)
            .copied()
            .ok_or_else(|| LedgerError::RecordNotFound(id.clone()))
    }

    async fn submit_record(&self, submission: &BidSubmission) -> Result<PendingTx, LedgerError> {
        let mut state = self.state.lock().await;
        state.write_calls += 1;

        if state.reject_next_submit {
            state.reject_next_submit = false;
            return Err(LedgerError::UserRejected);
        }
        if let Some(reason) = state.fail_next_submit.take() {
            return Err(LedgerError::SubmissionFailed(reason));
        }

        let id = submission.id.clone();
        let record = BidRecord {
            id: id.clone(),
            name: submission.name.clone(),
            public_value1: submission.public_value1,
            public_value2: submission.public_value2,
            description: submission.description.clone(),
            creator: submission.submitter,
            timestamp: now_secs(),
            is_verified: false,
            decrypted_value: 0,
        };
        state.handles.insert(id.clone(), keccak256(&submission.ciphertext));
        state.order.push(id.clone());
        state.records.insert(id.clone(), record);

        Ok(PendingTx::confirmed(receipt_for(&id)))
    }

    async fn submit_decryption_proof(
        &self,
        id: &BidId,
        clear_values: &Bytes,
        _proof: &Bytes,
    ) -> Result<PendingTx, LedgerError> {
        let mut state = self.state.lock().await;
        state.write_calls += 1;

        if state.reject_next_submit {
            state.reject_next_submit = false;
            return Err(LedgerError::UserRejected);
        }

        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| LedgerError::RecordNotFound(id.clone()))?;
        if record.is_verified {
            return Err(LedgerError::AlreadyVerified);
        }
        let value = abi::decode_first_word(clear_values)
            .ok_or_else(|| LedgerError::SubmissionFailed("malformed clear values".into()))?;

        record.is_verified = true;
        record.decrypted_value = value;
        state.confirmed_proofs += 1;

        Ok(PendingTx::confirmed(receipt_for(id)))
    }

    async fn is_available(&self) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.available)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::*;
    use crate::adapters::abi::encode_words;

    fn submission(id: &str, amount: u64) -> BidSubmission {
        BidSubmission {
            id: BidId::new(id),
            name: "item".into(),
            ciphertext: Bytes::from(format!("ct-{id}").into_bytes()),
            proof: Bytes::from_static(b"proof"),
            public_value1: amount,
            public_value2: 0,
            description: String::new(),
            submitter: Address::repeat_byte(0xAA),
        }
    }

    #[tokio::test]
    async fn submit_then_read_back() {
        let ledger = MockLedger::new();
        let receipt = ledger
            .submit_record(&submission("bid-1", 50))
            .await
            .unwrap()
            .confirm()
            .await
            .unwrap();
        assert!(receipt.success);

        let ids = ledger.list_record_ids().await.unwrap();
        assert_eq!(ids, vec![BidId::new("bid-1")]);

        let record = ledger.get_record(&BidId::new("bid-1")).await.unwrap();
        assert_eq!(record.public_value1, 50);
        assert!(!record.is_verified);
        assert_eq!(record.revealed_value(), None);
    }

    #[tokio::test]
    async fn handle_derived_from_ciphertext() {
        let ledger = MockLedger::new();
        let sub = submission("bid-1", 50);
        ledger.submit_record(&sub).await.unwrap();

        let handle = ledger.get_encrypted_handle(&sub.id).await.unwrap();
        assert_eq!(handle, keccak256(&sub.ciphertext));
    }

    #[tokio::test]
    async fn proof_finalizes_once() {
        let ledger = MockLedger::new();
        let sub = submission("bid-1", 50);
        ledger.submit_record(&sub).await.unwrap();

        let blob = encode_words(&[50]);
        let proof = Bytes::from_static(b"proof");
        ledger
            .submit_decryption_proof(&sub.id, &blob, &proof)
            .await
            .unwrap()
            .confirm()
            .await
            .unwrap();

        let record = ledger.get_record(&sub.id).await.unwrap();
        assert_eq!(record.revealed_value(), Some(50));

        // Second finalize is rejected, not applied.
        let second = ledger.submit_decryption_proof(&sub.id, &blob, &proof).await;
        assert!(matches!(second, Err(LedgerError::AlreadyVerified)));
        assert_eq!(ledger.confirmed_proofs().await, 1);
    }

    #[tokio::test]
    async fn rejection_consumed_by_one_write() {
        let ledger = MockLedger::new();
        ledger.reject_next_submit().await;

        let first = ledger.submit_record(&submission("bid-1", 1)).await;
        assert!(matches!(first, Err(LedgerError::UserRejected)));

        // Flag is one-shot; the retry goes through.
        ledger.submit_record(&submission("bid-1", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn injected_fetch_failure() {
        let ledger = MockLedger::new();
        let sub = submission("bid-1", 1);
        ledger.submit_record(&sub).await.unwrap();
        ledger.fail_fetch_of(sub.id.clone()).await;

        assert!(matches!(
            ledger.get_record(&sub.id).await,
            Err(LedgerError::Rpc(_))
        ));

        ledger.clear_fetch_failures().await;
        ledger.get_record(&sub.id).await.unwrap();
    }
}
