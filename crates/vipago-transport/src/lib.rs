//! Transport layer for payment-method creation sessions.
//!
//! Provides:
//! - Wire protocol (tagged JSON packets, one per text frame)
//! - WebSocket client transport (feature: websocket)

pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use protocol::{
    ClientPacket, CodecError, PAYMENT_METHOD_CREATION_PATH, ServerPacket, TerminalOutcome,
};

#[cfg(feature = "websocket")]
pub use websocket::{InboundFrame, TransportError, WsTransport};
