use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::Address;

use crate::ports::wallet::WalletSession;

/// Toggleable wallet session for tests and the demo.
pub struct MockWallet {
    address: Address,
    connected: AtomicBool,
}

impl MockWallet {
    pub fn connected(address: Address) -> Self {
        Self {
            address,
            connected: AtomicBool::new(true),
        }
    }

    pub fn disconnected(address: Address) -> Self {
        Self {
            address,
            connected: AtomicBool::new(false),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl WalletSession for MockWallet {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn address(&self) -> Option<Address> {
        self.is_connected().then_some(self.address)
    }
}
