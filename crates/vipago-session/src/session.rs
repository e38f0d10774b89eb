//! Payment-method creation session.
//!
//! One session opens one socket, sends the opening request and then runs
//! three consumers of the socket's inbound frames under a single cancellation
//! scope:
//! - the gateway handler tokenizes with every gateway the server offers,
//!   answering each offer with the tokenized method or `NextGateway`;
//! - the details handler echoes the raw details whenever the server asks;
//! - the terminal race waits for the first terminal packet.
//!
//! When the race resolves the session is marked finished and the scope is
//! cancelled, then the handlers are awaited and the socket is closed. Handler
//! replies are sent under the same lock that marks the session finished, and
//! each handler also stops at the first terminal packet it sees, so nothing is
//! sent after the outcome.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::{sync::CancellationToken, task::TaskTracker};
use vipago_core::{
    CustomerId, GatewayCandidate, GatewayError, NewPaymentMethodDetails, PaymentMethod,
    PaymentMethodRecord, Subscription,
};
use vipago_gateway::GatewayRegistry;
use vipago_transport::{ClientPacket, InboundFrame, ServerPacket, TerminalOutcome, WsTransport};

use crate::{
    config::SessionConfig,
    error::{NetworkError, SessionError},
};

/// Creates payment methods over the platform's creation socket.
#[derive(Debug, Clone)]
pub struct PaymentMethodSession {
    config: SessionConfig,
    gateways: Arc<GatewayRegistry>,
}

impl PaymentMethodSession {
    /// Create a session factory.
    #[must_use]
    pub fn new(config: SessionConfig, gateways: GatewayRegistry) -> Self {
        Self {
            config,
            gateways: Arc::new(gateways),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create a payment method for `customer_id` from raw `details`.
    ///
    /// The details stay in memory and are only sent to the platform on its
    /// request and to the gateways it offers.
    ///
    /// # Errors
    /// - [`SessionError::PciScope`] before any I/O if the configuration does
    ///   not allow holding card data
    /// - [`SessionError::Network`] if the socket fails or a frame does not decode
    /// - [`SessionError::NoSuitableGateways`] / [`SessionError::CustomerNotFound`]
    ///   when the server ends the session that way
    pub async fn create_payment_method(
        &self,
        customer_id: CustomerId,
        details: NewPaymentMethodDetails,
    ) -> Result<PaymentMethodRecord, SessionError> {
        if !self.config.allows_card_data() {
            return Err(SessionError::PciScope);
        }

        let url = self.config.websocket_url();
        let transport = WsTransport::connect(&url)
            .await
            .map_err(NetworkError::from)?;
        let payment_method_name = details.payment_method_name();

        let ctx = Arc::new(SessionContext {
            transport,
            details,
            gateways: Arc::clone(&self.gateways),
            scope: CancellationToken::new(),
            finished: Mutex::new(false),
        });
        // Dropping this future mid-session still cancels the handlers
        let _scope_guard = ctx.scope.clone().drop_guard();

        // Subscribe before the opening request so no reply can be missed
        let gateway_frames = ctx.transport.subscribe();
        let details_frames = ctx.transport.subscribe();
        let mut terminal_frames = ctx.transport.subscribe();

        let handlers = TaskTracker::new();
        handlers.spawn(Arc::clone(&ctx).handle_gateway_requests(gateway_frames));
        handlers.spawn(Arc::clone(&ctx).handle_details_requests(details_frames));
        handlers.close();

        let outcome = match ctx.send(&ClientPacket::PaymentMethodRequest {
            customer_id,
            payment_method_name,
        }) {
            Ok(()) => wait_for_outcome(&mut terminal_frames).await,
            Err(e) => Err(e),
        };

        ctx.finish();
        handlers.wait().await;
        ctx.transport.shutdown().await;

        match outcome? {
            TerminalOutcome::Done(payment_method) => {
                tracing::info!("Payment method {} created", payment_method.id);
                Ok(payment_method)
            }
            TerminalOutcome::NoMoreGatewaysLeft => Err(SessionError::NoSuitableGateways),
            TerminalOutcome::CustomerNotFound => Err(SessionError::CustomerNotFound),
        }
    }
}

/// First terminal packet on `frames`; anything after it is never read.
async fn wait_for_outcome(
    frames: &mut Subscription<InboundFrame>,
) -> Result<TerminalOutcome, NetworkError> {
    while let Some(frame) = frames.recv().await {
        let packet = ServerPacket::decode(&frame?)?;
        tracing::debug!("Received {}", packet.tag());
        if let Some(outcome) = packet.into_terminal() {
            return Ok(outcome);
        }
    }
    Err(NetworkError::ClosedBeforeOutcome)
}

/// State shared by the handlers of one session.
struct SessionContext {
    transport: WsTransport,
    details: NewPaymentMethodDetails,
    gateways: Arc<GatewayRegistry>,
    scope: CancellationToken,
    /// Set once the outcome is known; guards every handler reply.
    finished: Mutex<bool>,
}

impl SessionContext {
    fn send(&self, packet: &ClientPacket) -> Result<(), NetworkError> {
        let frame = packet.encode()?;
        self.transport.send(frame)?;
        tracing::debug!("Sent {}", packet.tag());
        Ok(())
    }

    /// Mark the session finished and stop the handlers.
    fn finish(&self) {
        *self.finished.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.scope.cancel();
    }

    /// Send a handler reply unless the session is finished. Returns whether
    /// the handler may keep going.
    fn reply(&self, packet: &ClientPacket) -> bool {
        let finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        !*finished && self.send(packet).is_ok()
    }

    /// Next server packet for a handler, or `None` once the handler must stop.
    ///
    /// Undecodable frames are skipped here; the terminal race reports them.
    /// A terminal packet ends the handler even before the scope is cancelled.
    async fn next_packet(&self, frames: &mut Subscription<InboundFrame>) -> Option<ServerPacket> {
        loop {
            let frame = tokio::select! {
                biased;
                () = self.scope.cancelled() => return None,
                frame = frames.recv() => frame,
            };
            let Some(Ok(text)) = frame else {
                return None;
            };
            match ServerPacket::decode(&text) {
                Ok(packet) if packet.is_terminal() => return None,
                Ok(packet) => return Some(packet),
                Err(_) => {}
            }
        }
    }

    async fn handle_gateway_requests(self: Arc<Self>, mut frames: Subscription<InboundFrame>) {
        while let Some(packet) = self.next_packet(&mut frames).await {
            let ServerPacket::GatewayRequest(candidate) = packet else {
                continue;
            };
            let reply = tokio::select! {
                biased;
                () = self.scope.cancelled() => break,
                reply = self.attempt_gateway(&candidate) => reply,
            };
            if !self.reply(&reply) {
                break;
            }
        }
    }

    async fn handle_details_requests(self: Arc<Self>, mut frames: Subscription<InboundFrame>) {
        while let Some(packet) = self.next_packet(&mut frames).await {
            if !matches!(packet, ServerPacket::GetPaymentMethodDetailsRequest) {
                continue;
            }
            let reply = ClientPacket::GetPaymentMethodDetailsResponse {
                new_payment_method: self.details.clone(),
            };
            if !self.reply(&reply) {
                break;
            }
        }
    }

    /// Reply to one gateway offer. Any adapter failure asks for the next gateway.
    async fn attempt_gateway(&self, candidate: &GatewayCandidate) -> ClientPacket {
        let gateway = candidate.gateway_internal_name.as_str();
        match self.tokenize(candidate).await {
            Ok(payment) => {
                tracing::info!("Tokenized payment method with gateway `{gateway}`");
                ClientPacket::PaymentMethodCreationResponse { payment }
            }
            Err(e) => {
                tracing::warn!("Gateway `{gateway}` failed, requesting the next one: {e}");
                ClientPacket::NextGateway
            }
        }
    }

    async fn tokenize(&self, candidate: &GatewayCandidate) -> Result<PaymentMethod, GatewayError> {
        let last4_digits = self
            .details
            .last4_digits()
            .ok_or(GatewayError::InvalidCardNumber)?;
        let data = self.gateways.tokenize(candidate, &self.details).await?;
        Ok(PaymentMethod::card(data, last4_digits))
    }
}
