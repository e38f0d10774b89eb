//! Core models and abstractions for Vipago payment-method creation.
//!
//! This crate provides the fundamental building blocks:
//! - `FrameBus` - Unbounded multi-consumer pub/sub for inbound frames
//! - Identifier and payment-method models matching the platform's wire schema
//! - `GatewayAdapter` trait for tokenizing card data against a gateway

pub mod frame_bus;
pub mod ids;
pub mod payment_method;
pub mod traits;

pub use frame_bus::{FrameBus, Subscription};
pub use ids::{CustomerId, IdError, NonEmptyString, PaymentMethodId, WorkspaceId};
pub use payment_method::{
    BillingAddress, CardPaymentMethod, Expandable, GatewaySpecificData, NewCardDetails,
    NewPaymentMethodDetails, PaymentMethod, PaymentMethodRecord, StripeCardData,
};
pub use traits::{GatewayAdapter, GatewayCandidate, GatewayError};
