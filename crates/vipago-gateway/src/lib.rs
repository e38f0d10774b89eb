//! Payment gateway adapters.
//!
//! Provides:
//! - `StripeGateway` - card tokenization with a Stripe publishable key
//! - `GatewayRegistry` - adapter lookup by the gateway's internal name

pub mod registry;
pub mod stripe;

pub use registry::GatewayRegistry;
pub use stripe::{STRIPE_PAYMENT_METHODS_URL, StripeGateway};
