//! Process-wide FHE session readiness.
//!
//! The encryption capability is lazily initialized on the first wallet
//! connection. Connect events can arrive repeatedly (reconnects, UI
//! re-renders); while an initialization is in flight those duplicates are
//! dropped, not queued, and once the session is ready they are no-ops.

use std::sync::Arc;

use tracing::{debug, info};

use crate::ports::gateway::{EncryptionGateway, GatewayError};
use crate::singleflight::{Flight, SingleFlight};

/// What a connect event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// This call ran the underlying initialization.
    Initialized,
    /// Session was already ready.
    AlreadyReady,
    /// An initialization was in flight; this duplicate was dropped.
    Dropped,
}

/// Single-flight guard around [`EncryptionGateway::initialize`].
pub struct FheSession<G: EncryptionGateway> {
    gateway: Arc<G>,
    init_flight: SingleFlight,
}

impl<G: EncryptionGateway> FheSession<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            init_flight: SingleFlight::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn is_ready(&self) -> bool {
        self.gateway.is_initialized()
    }

    /// Handle a connect event. Failure leaves the session retryable; the
    /// retry is user-initiated (the next connect event), never automatic.
    pub async fn ensure_initialized(&self) -> Result<InitOutcome, GatewayError> {
        if self.gateway.is_initialized() {
            return Ok(InitOutcome::AlreadyReady);
        }
        match self.init_flight.begin() {
            Flight::Joined(_) => {
                debug!("initialization in flight, dropping duplicate connect event");
                Ok(InitOutcome::Dropped)
            }
            Flight::Leader(guard) => {
                let result = self.gateway.initialize().await;
                drop(guard);
                result.map(|()| {
                    info!("fhe session initialized");
                    InitOutcome::Initialized
                })
            }
        }
    }
}
