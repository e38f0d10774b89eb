//! Wire protocol for payment-method creation.
//!
//! One JSON object per text frame, discriminated by its `_tag` field.

use serde::{Deserialize, Serialize};
use vipago_core::{
    CustomerId, GatewayCandidate, NewPaymentMethodDetails, NonEmptyString, PaymentMethod,
    PaymentMethodRecord,
};

/// Path of the payment-method creation socket, relative to the API base URL.
pub const PAYMENT_METHOD_CREATION_PATH: &str = "/api/v1/payment-methods/create";

/// Codec error.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to encode packet: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode packet: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Packet from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum ClientPacket {
    /// Opens the session.
    #[serde(rename = "paymentMethodRequest", rename_all = "camelCase")]
    PaymentMethodRequest {
        customer_id: CustomerId,
        payment_method_name: NonEmptyString,
    },
    /// Tokenization with the offered gateway succeeded.
    #[serde(rename = "paymentMethodCreationResponse")]
    PaymentMethodCreationResponse { payment: PaymentMethod },
    /// Tokenization with the offered gateway failed; asks for another one.
    #[serde(rename = "nextGateway")]
    NextGateway,
    /// Raw details, echoed on request.
    #[serde(rename = "getPaymentMethodDetailsResponse", rename_all = "camelCase")]
    GetPaymentMethodDetailsResponse {
        new_payment_method: NewPaymentMethodDetails,
    },
}

impl ClientPacket {
    /// Wire tag, for logging.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::PaymentMethodRequest { .. } => "paymentMethodRequest",
            Self::PaymentMethodCreationResponse { .. } => "paymentMethodCreationResponse",
            Self::NextGateway => "nextGateway",
            Self::GetPaymentMethodDetailsResponse { .. } => "getPaymentMethodDetailsResponse",
        }
    }

    /// Encode to a JSON text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }

    /// Decode from a JSON text frame.
    ///
    /// # Errors
    /// Returns error if the frame is not a valid client packet.
    pub fn decode(frame: &str) -> Result<Self, CodecError> {
        serde_json::from_str(frame).map_err(CodecError::Decode)
    }
}

/// Packet from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum ServerPacket {
    /// Offers one gateway for a tokenization attempt.
    #[serde(rename = "serverGatewayRequest")]
    GatewayRequest(GatewayCandidate),
    /// Asks the client to send the raw details again.
    #[serde(rename = "GetPaymentMethodDetailsRequest")]
    GetPaymentMethodDetailsRequest,
    /// Payment method created.
    #[serde(rename = "done", rename_all = "camelCase")]
    Done { payment_method: PaymentMethodRecord },
    /// Every gateway was tried without success.
    #[serde(rename = "noMoreGatewaysLeft")]
    NoMoreGatewaysLeft,
    /// The customer in the opening request does not exist.
    #[serde(rename = "customerNotFound")]
    CustomerNotFound,
}

/// Outcome carried by a terminal server packet.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalOutcome {
    Done(PaymentMethodRecord),
    NoMoreGatewaysLeft,
    CustomerNotFound,
}

impl ServerPacket {
    /// Wire tag, for logging.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::GatewayRequest(_) => "serverGatewayRequest",
            Self::GetPaymentMethodDetailsRequest => "GetPaymentMethodDetailsRequest",
            Self::Done { .. } => "done",
            Self::NoMoreGatewaysLeft => "noMoreGatewaysLeft",
            Self::CustomerNotFound => "customerNotFound",
        }
    }

    /// Whether this packet ends the session.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done { .. } | Self::NoMoreGatewaysLeft | Self::CustomerNotFound
        )
    }

    /// Convert a terminal packet into its outcome; `None` for non-terminal packets.
    #[must_use]
    pub fn into_terminal(self) -> Option<TerminalOutcome> {
        match self {
            Self::Done { payment_method } => Some(TerminalOutcome::Done(payment_method)),
            Self::NoMoreGatewaysLeft => Some(TerminalOutcome::NoMoreGatewaysLeft),
            Self::CustomerNotFound => Some(TerminalOutcome::CustomerNotFound),
            Self::GatewayRequest(_) | Self::GetPaymentMethodDetailsRequest => None,
        }
    }

    /// Encode to a JSON text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }

    /// Decode from a JSON text frame.
    ///
    /// Unknown tags and structurally invalid packets are decode failures.
    ///
    /// # Errors
    /// Returns error if the frame is not a valid server packet.
    pub fn decode(frame: &str) -> Result<Self, CodecError> {
        serde_json::from_str(frame).map_err(CodecError::Decode)
    }
}
