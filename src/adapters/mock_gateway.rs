use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{keccak256, Address, Bytes, B256};
use tokio::sync::Mutex;

use crate::adapters::abi;
use crate::ports::gateway::{DecryptionResult, EncryptedPayload, EncryptionGateway, GatewayError};
use crate::ports::ledger::LedgerError;
use crate::ports::TxReceipt;

/// Deterministic stand-in for the FHE capability.
///
/// "Encryption" packs the triple plus a nonce into the ciphertext and
/// remembers the plaintext under the derived handle (keccak256 of the
/// ciphertext, mirroring how the mock ledger derives handles). The nonce
/// guarantees payloads are never reused across submissions, even for equal
/// amounts.
pub struct MockFheGateway {
    initialized: AtomicBool,
    fail_init: AtomicBool,
    init_delay: Mutex<Option<Duration>>,
    init_calls: AtomicU32,
    nonce: AtomicU64,
    plaintexts: Mutex<HashMap<B256, u64>>,
}

impl MockFheGateway {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            fail_init: AtomicBool::new(false),
            init_delay: Mutex::new(None),
            init_calls: AtomicU32::new(0),
            nonce: AtomicU64::new(0),
            plaintexts: Mutex::new(HashMap::new()),
        }
    }

    /// Make `initialize` fail until cleared.
    pub fn set_fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    /// Stretch initialization, for single-flight tests.
    pub async fn set_init_delay(&self, delay: Duration) {
        *self.init_delay.lock().await = Some(delay);
    }

    /// How many times the underlying initialization actually ran.
    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockFheGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptionGateway for MockFheGateway {
    async fn initialize(&self) -> Result<(), GatewayError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.init_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(GatewayError::InitializationFailed(
                "capability unavailable".into(),
            ));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn encrypt(
        &self,
        context: Address,
        submitter: Address,
        plaintext: u64,
    ) -> Result<EncryptedPayload, GatewayError> {
        if !self.is_initialized() {
            return Err(GatewayError::NotInitialized);
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut ciphertext = Vec::with_capacity(20 + 20 + 8 + 8);
        ciphertext.extend_from_slice(context.as_slice());
        ciphertext.extend_from_slice(submitter.as_slice());
        ciphertext.extend_from_slice(&plaintext.to_be_bytes());
        ciphertext.extend_from_slice(&nonce.to_be_bytes());
        let ciphertext = Bytes::from(ciphertext);

        let handle = keccak256(&ciphertext);
        let mut proof_preimage = Vec::with_capacity(32 + 20);
        proof_preimage.extend_from_slice(handle.as_slice());
        proof_preimage.extend_from_slice(context.as_slice());
        let proof = Bytes::copy_from_slice(keccak256(&proof_preimage).as_slice());

        self.plaintexts.lock().await.insert(handle, plaintext);

        Ok(EncryptedPayload { ciphertext, proof })
    }

    async fn request_decryption<F, Fut>(
        &self,
        handles: Vec<B256>,
        _context: Address,
        finalize: F,
    ) -> Result<DecryptionResult, GatewayError>
    where
        F: FnOnce(Bytes, Bytes) -> Fut + Send,
        Fut: Future<Output = Result<TxReceipt, LedgerError>> + Send,
    {
        if !self.is_initialized() {
            return Err(GatewayError::NotInitialized);
        }

        let clear_values = {
            let plaintexts = self.plaintexts.lock().await;
            let mut out = HashMap::with_capacity(handles.len());
            for handle in &handles {
                let value = plaintexts
                    .get(handle)
                    .copied()
                    .ok_or_else(|| GatewayError::DecryptionFailed(format!("unknown handle {handle}")))?;
                out.insert(*handle, value);
            }
            out
        };

        let values_in_order: Vec<u64> = handles
            .iter()
            .filter_map(|h| clear_values.get(h).copied())
            .collect();
        let blob = abi::encode_words(&values_in_order);
        let proof = Bytes::copy_from_slice(keccak256(&blob).as_slice());

        // Commit before returning; the result is only valid once the ledger
        // accepted the proof.
        let receipt = finalize(blob, proof).await.map_err(|e| match e {
            LedgerError::AlreadyVerified => GatewayError::AlreadyVerified,
            other => GatewayError::Finalize(other),
        })?;

        Ok(DecryptionResult {
            clear_values,
            receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: Address = Address::repeat_byte(0x11);
    const SUBMITTER: Address = Address::repeat_byte(0x22);

    #[tokio::test]
    async fn encrypt_requires_initialization() {
        let gateway = MockFheGateway::new();
        let result = gateway.encrypt(CONTEXT, SUBMITTER, 50).await;
        assert!(matches!(result, Err(GatewayError::NotInitialized)));

        gateway.initialize().await.unwrap();
        gateway.encrypt(CONTEXT, SUBMITTER, 50).await.unwrap();
    }

    #[tokio::test]
    async fn equal_amounts_yield_distinct_payloads() {
        let gateway = MockFheGateway::new();
        gateway.initialize().await.unwrap();

        let a = gateway.encrypt(CONTEXT, SUBMITTER, 50).await.unwrap();
        let b = gateway.encrypt(CONTEXT, SUBMITTER, 50).await.unwrap();
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.proof, b.proof);
    }

    #[tokio::test]
    async fn decryption_round_trips_through_finalize() {
        let gateway = MockFheGateway::new();
        gateway.initialize().await.unwrap();

        let payload = gateway.encrypt(CONTEXT, SUBMITTER, 50).await.unwrap();
        let handle = keccak256(&payload.ciphertext);

        let result = gateway
            .request_decryption(vec![handle], CONTEXT, |blob, _proof| async move {
                assert_eq!(abi::decode_first_word(&blob), Some(50));
                Ok(TxReceipt {
                    tx_hash: B256::ZERO,
                    success: true,
                })
            })
            .await
            .unwrap();

        assert_eq!(result.clear_values.get(&handle), Some(&50));
        assert!(result.receipt.success);
    }

    #[tokio::test]
    async fn already_verified_surfaces_as_such() {
        let gateway = MockFheGateway::new();
        gateway.initialize().await.unwrap();

        let payload = gateway.encrypt(CONTEXT, SUBMITTER, 50).await.unwrap();
        let handle = keccak256(&payload.ciphertext);

        let result = gateway
            .request_decryption(vec![handle], CONTEXT, |_blob, _proof| async move {
                Err(LedgerError::AlreadyVerified)
            })
            .await;
        assert!(matches!(result, Err(GatewayError::AlreadyVerified)));
    }

    #[tokio::test]
    async fn unknown_handle_fails_before_finalize() {
        let gateway = MockFheGateway::new();
        gateway.initialize().await.unwrap();

        let result = gateway
            .request_decryption(vec![B256::repeat_byte(0x99)], CONTEXT, |_b, _p| async move {
                panic!("finalize must not run for unknown handles");
            })
            .await;
        assert!(matches!(result, Err(GatewayError::DecryptionFailed(_))));
    }

    #[tokio::test]
    async fn failed_init_is_retryable() {
        let gateway = MockFheGateway::new();
        gateway.set_fail_init(true);
        assert!(gateway.initialize().await.is_err());
        assert!(!gateway.is_initialized());

        gateway.set_fail_init(false);
        gateway.initialize().await.unwrap();
        assert!(gateway.is_initialized());
    }
}
