//! Session errors.

use vipago_transport::{CodecError, TransportError};

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a boolean, got {value:?}")]
    InvalidBool { key: &'static str, value: String },
    #[error("Invalid API URL {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },
}

/// Connection or wire failure that ends a session.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Connection closed before the session finished")]
    ClosedBeforeOutcome,
}

/// Session error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(
        "Creating payment methods outside the browser puts this process in PCI scope, \
         because the raw card data has to be held in memory. Set VIPAGO_UNSAFE_MODE=true \
         to proceed anyway."
    )]
    PciScope,
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("No suitable gateway could create the payment method")]
    NoSuitableGateways,
    #[error("Customer not found")]
    CustomerNotFound,
}
