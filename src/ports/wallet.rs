use alloy_primitives::Address;

/// Read-only view of the wallet/identity session.
///
/// The lifecycle controller observes this signal to gate every mutating
/// operation; it never manages keys or connections itself.
///
/// Implementations:
/// - `MockWallet` (for tests and the demo)
pub trait WalletSession: Send + Sync {
    fn is_connected(&self) -> bool;

    /// The connected identity, `None` while disconnected.
    fn address(&self) -> Option<Address>;
}
