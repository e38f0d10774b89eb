//! Payment-method creation sessions for the Vipago platform.
//!
//! Provides:
//! - `PaymentMethodSession` - drive one creation session over the platform socket
//! - `SessionConfig` - API location and the PCI-scope gate

pub mod config;
pub mod error;
pub mod session;

pub use config::{RuntimeEnvironment, SessionConfig};
pub use error::{ConfigError, NetworkError, SessionError};
pub use session::PaymentMethodSession;
