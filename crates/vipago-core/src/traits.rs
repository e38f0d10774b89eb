//! Gateway adapter abstraction.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GatewaySpecificData, NewPaymentMethodDetails, NonEmptyString};

/// One gateway the server offers for a single tokenization attempt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCandidate {
    /// Internal name of the gateway (e.g. `stripe`).
    pub gateway_internal_name: NonEmptyString,
    /// Credential to use against the gateway's own API, if it needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<NonEmptyString>,
}

impl GatewayCandidate {
    /// Create a candidate.
    #[must_use]
    pub const fn new(gateway_internal_name: NonEmptyString, api_key: Option<NonEmptyString>) -> Self {
        Self {
            gateway_internal_name,
            api_key,
        }
    }
}

impl fmt::Debug for GatewayCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCandidate")
            .field("gateway_internal_name", &self.gateway_internal_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Failure of one tokenization attempt.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No adapter for gateway `{0}`")]
    UnknownGateway(String),
    #[error("Gateway `{0}` requires an API key")]
    MissingCredential(String),
    #[error("Card number contains no digits")]
    InvalidCardNumber,
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Gateway rejected the request with status {status}")]
    Rejected { status: u16 },
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Trait for payment gateway adapters.
///
/// An adapter exchanges raw payment details for an opaque gateway reference
/// by calling the gateway's own API. Details must not be sent anywhere else.
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    /// Internal name the server uses to offer this gateway.
    fn internal_name(&self) -> &str;

    /// Tokenize `details` with this gateway.
    ///
    /// # Arguments
    /// * `api_key` - Credential supplied by the server for this attempt
    /// * `details` - Raw payment details held by the session
    async fn tokenize(
        &self,
        api_key: Option<&str>,
        details: &NewPaymentMethodDetails,
    ) -> Result<GatewaySpecificData, GatewayError>;
}
