//! Blind-auction bid lifecycle orchestration.
//!
//! Bid amounts are encrypted client-side through an opaque FHE capability,
//! stored on an auction ledger in encrypted form, and decrypted only through
//! an authenticated reveal that commits a proof-carrying cleartext back to
//! the ledger. This crate is the orchestration layer: the state machine that
//! moves a bid through creation, encryption, submission and reveal, the
//! registry cache it reads from, and the invariants between them
//! (confidentiality until reveal, no double-reveal, refresh-on-terminal).
//!
//! The ledger, the FHE primitive and the wallet are reached through the
//! traits in [`ports`]; [`adapters`] provides the in-memory implementations
//! used by tests and the demo binary.

pub mod adapters;
pub mod domain;
pub mod lifecycle;
pub mod ports;
pub mod registry;
pub mod session;
pub mod singleflight;
pub mod status;

pub use lifecycle::{BidLifecycleController, LifecycleError, LifecyclePhase, PlaceBid, RevealPhase};
pub use registry::{BidRegistry, RegistryError, RegistrySnapshot};
pub use session::{FheSession, InitOutcome};
pub use status::{Status, StatusReporter};
