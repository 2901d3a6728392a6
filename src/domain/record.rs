use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, Bytes};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opaque, caller-generated bid record identifier.
///
/// Collision resistance comes from a millisecond timestamp plus random
/// entropy, so two bids placed in the same instant still get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BidId(String);

impl BidId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id: `bid-{unix_millis}-{entropy}`.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let entropy: u32 = rand::thread_rng().gen();
        Self(format!("bid-{millis}-{entropy:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bid amount in whole bid units, validated at the input boundary.
///
/// The auction bids in integers; fractional input (e.g. ETH-denominated
/// "50.9") is truncated at the decimal point rather than rejected, matching
/// the submission form. Negative or non-numeric input is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BidAmount(u64);

impl BidAmount {
    pub fn new(units: u64) -> Self {
        Self(units)
    }

    pub fn units(&self) -> u64 {
        self.0
    }
}

impl FromStr for BidAmount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(format!("bid amount must be non-negative: {s}"));
        }
        // Truncate fractional input to whole bid units.
        let integral = s.split('.').next().unwrap_or("");
        if integral.is_empty() {
            return Err(format!("invalid bid amount: {s:?}"));
        }
        integral
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("invalid bid amount {s:?}: {e}"))
    }
}

impl fmt::Display for BidAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A bid record as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub id: BidId,
    pub name: String,
    /// Plaintext mirror of the bid amount, stored alongside the ciphertext
    /// for demo analytics. Publishing it defeats the confidentiality the
    /// encrypted bid provides; kept for ledger-format fidelity.
    pub public_value1: u64,
    /// Reserved second public field, always 0 on submission.
    pub public_value2: u64,
    pub description: String,
    pub creator: Address,
    /// Seconds since epoch, assigned by the ledger at inclusion.
    pub timestamp: u64,
    pub is_verified: bool,
    /// Authoritative and immutable once `is_verified` is true; garbage
    /// before that. Read through [`BidRecord::revealed_value`].
    pub decrypted_value: u64,
}

impl BidRecord {
    /// The verified cleartext bid, or `None` while the record is still
    /// encrypted. Pre-verification `decrypted_value` must be treated as
    /// unknown even if a stale number is cached.
    pub fn revealed_value(&self) -> Option<u64> {
        self.is_verified.then_some(self.decrypted_value)
    }
}

/// Write-path payload for a new bid record.
///
/// Built once per (bid, submitter, context) triple; the ciphertext and proof
/// inside are produced for exactly that triple and never reused.
#[derive(Debug, Clone)]
pub struct BidSubmission {
    pub id: BidId,
    pub name: String,
    pub ciphertext: Bytes,
    pub proof: Bytes,
    pub public_value1: u64,
    pub public_value2: u64,
    pub description: String,
    pub submitter: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = BidId::generate();
        let b = BidId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("bid-"));
    }

    #[test]
    fn amount_parses_integers() {
        assert_eq!("50".parse::<BidAmount>().unwrap().units(), 50);
        assert_eq!("0".parse::<BidAmount>().unwrap().units(), 0);
    }

    #[test]
    fn amount_truncates_fractional_input() {
        assert_eq!("50.9".parse::<BidAmount>().unwrap().units(), 50);
        assert_eq!("3.001".parse::<BidAmount>().unwrap().units(), 3);
    }

    #[test]
    fn amount_rejects_negative_and_garbage() {
        assert!("-1".parse::<BidAmount>().is_err());
        assert!("abc".parse::<BidAmount>().is_err());
        assert!("".parse::<BidAmount>().is_err());
        assert!(".5".parse::<BidAmount>().is_err());
    }

    #[test]
    fn revealed_value_gated_on_verification() {
        let mut record = BidRecord {
            id: BidId::new("bid-1"),
            name: "Vase".into(),
            public_value1: 50,
            public_value2: 0,
            description: String::new(),
            creator: Address::ZERO,
            timestamp: 0,
            is_verified: false,
            // Stale cached number — must not leak through the accessor.
            decrypted_value: 42,
        };
        assert_eq!(record.revealed_value(), None);

        record.is_verified = true;
        record.decrypted_value = 50;
        assert_eq!(record.revealed_value(), Some(50));
    }
}
