//! In-memory adapters for the ports, used by tests and the demo binary.

pub mod abi;
pub mod mock_gateway;
pub mod mock_ledger;
pub mod mock_wallet;
