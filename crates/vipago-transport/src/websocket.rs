//! WebSocket client transport.
//!
//! A single socket read loop publishes every inbound text frame on a
//! [`FrameBus`], so any number of consumers can follow the same connection.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use vipago_core::{FrameBus, Subscription};

/// Inbound item: a text frame, or the error that ended the connection.
pub type InboundFrame = Result<Arc<str>, TransportError>;

/// Transport error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("Connection is closed")]
    Closed,
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}

/// Client side of one WebSocket connection.
///
/// Dropping the transport closes the socket if it is still open.
pub struct WsTransport {
    url: String,
    outbound: mpsc::UnboundedSender<Message>,
    bus: Arc<FrameBus<InboundFrame>>,
    /// Set by the reader once the socket stops yielding frames.
    remote_closed: Arc<AtomicBool>,
    close_requested: AtomicBool,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl WsTransport {
    /// Open a connection.
    ///
    /// # Errors
    /// Returns [`TransportError::Connect`] if the socket cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        tracing::info!("Connecting websocket to {url}");
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!("Connected to {url}");

        let (mut sink, mut stream) = socket.split();
        let (outbound, mut rx) = mpsc::unbounded_channel::<Message>();
        let bus = Arc::new(FrameBus::new());
        let remote_closed = Arc::new(AtomicBool::new(false));
        let shutdown = CancellationToken::new();
        let tasks = TaskTracker::new();

        // Writer: forwards queued frames until a close frame goes out or the
        // transport shuts down; queued frames win over shutdown
        let writer_shutdown = shutdown.clone();
        tasks.spawn(async move {
            loop {
                let next = tokio::select! {
                    biased;
                    msg = rx.recv() => msg,
                    () = writer_shutdown.cancelled() => None,
                };
                let Some(msg) = next else {
                    break;
                };
                let is_close = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    tracing::debug!("Websocket write failed: {e}");
                    break;
                }
                if is_close {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: the only consumer of the socket's inbound half
        let reader_bus = Arc::clone(&bus);
        let reader_closed = Arc::clone(&remote_closed);
        let reader_shutdown = shutdown.clone();
        tasks.spawn(async move {
            loop {
                let next = tokio::select! {
                    biased;
                    () = reader_shutdown.cancelled() => break,
                    next = stream.next() => next,
                };
                match next {
                    Some(Ok(Message::Text(text))) => {
                        reader_bus.publish(Ok(Arc::from(text)));
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Binary frames carry no packets; ping/pong is handled by tungstenite
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("Websocket error: {e}");
                        reader_bus.publish(Err(TransportError::ConnectionLost(e.to_string())));
                        break;
                    }
                }
            }
            reader_closed.store(true, Ordering::SeqCst);
            reader_bus.close();
        });
        tasks.close();

        Ok(Self {
            url: url.to_string(),
            outbound,
            bus,
            remote_closed,
            close_requested: AtomicBool::new(false),
            shutdown,
            tasks,
        })
    }

    /// Queue a text frame for sending.
    ///
    /// # Errors
    /// Returns [`TransportError::Closed`] once the connection is closed.
    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(Message::Text(frame))
            .map_err(|_| TransportError::Closed)
    }

    /// Subscribe to inbound frames received from now on.
    ///
    /// The subscription ends when the connection closes; a connection error is
    /// delivered as a final `Err` item.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<InboundFrame> {
        self.bus.subscribe()
    }

    /// Whether the connection is closed or closing.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.close_requested.load(Ordering::SeqCst) || self.remote_closed.load(Ordering::SeqCst)
    }

    /// Close the connection. Only the first call has an effect, whether or not
    /// the peer already closed its side.
    pub fn close(&self) {
        if self.close_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Closing websocket to {}", self.url);
        let _ = self.outbound.send(Message::Close(None));
        self.shutdown.cancel();
        self.bus.close();
    }

    /// Close the connection and wait for the socket tasks to finish.
    pub async fn shutdown(&self) {
        self.close();
        self.tasks.wait().await;
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}
