//! WebSocket push subscriber.
//!
//! Maintains a single socket to the server's push route, parses framed
//! JSON messages into typed [`PushEvent`]s, and broadcasts them. Lost
//! connections are retried with linearly growing jittered delays; after
//! five consecutive failures the client gives up rather than thrash the
//! server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::schema::{parse_push_message, OpenPlotDetail, PlotUpdate, PushMessage, SoldPlotDetail};

/// Consecutive failed attempts tolerated before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Broadcast channel capacity for push events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Delay before reconnect attempt `attempt` (1-based): 5–15 s of jitter
/// scaled linearly by the attempt number.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let jitter = rand::rng().random_range(5_000..=15_000u64);
    Duration::from_millis(jitter * attempt as u64)
}

/// Lifecycle of the push socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Reconnecting,
}

/// A decoded plot event received over the push socket.
#[derive(Debug, Clone)]
pub enum PushEvent {
    PlotOpen(OpenPlotDetail),
    PlotUpdate(PlotUpdate),
    PlotSold(SoldPlotDetail),
}

/// Produces the `jwt` query parameter for the legacy authenticated
/// route. Called on every (re)connect so the token stays fresh.
pub type TokenSource = dyn Fn() -> Option<String> + Send + Sync;

/// How a socket session ended, deciding the next transition.
enum SessionEnd {
    /// `dispose()` was called; no reconnect.
    Disposed,
    /// The server closed with a normal code; no reconnect.
    CleanClose,
    /// Unclean close, server-restart close, transport error, or a
    /// failed connect; reconnect if attempts remain.
    Failed,
}

/// WebSocket subscriber for plot push notifications.
///
/// The client never sends application messages; the server knows which
/// user it is talking to from the authenticated URL.
pub struct PushClient {
    ws_url: String,
    token_source: Option<Box<TokenSource>>,
    event_tx: broadcast::Sender<PushEvent>,
    state: Mutex<ConnectionState>,
    cancel: CancellationToken,
}

impl PushClient {
    pub fn new(ws_url: String, token_source: Option<Box<TokenSource>>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            ws_url,
            token_source,
            event_tx,
            state: Mutex::new(ConnectionState::Disconnected),
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to decoded push events.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.event_tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Begin connecting on a background task; returns immediately.
    pub fn start(self: &Arc<Self>) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            client.run().await;
        });
    }

    /// Cancel pending reconnects and close the socket gracefully.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    // ---- private helpers ----

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("state lock poisoned") = state;
    }

    fn connect_url(&self) -> String {
        match self.token_source.as_ref().and_then(|source| source()) {
            Some(token) => format!("{}?jwt={}", self.ws_url, token),
            None => self.ws_url.clone(),
        }
    }

    /// Core loop: connect, read frames, reconnect on failure.
    async fn run(self: Arc<Self>) {
        let mut attempts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                self.set_state(ConnectionState::Disconnected);
                return;
            }

            self.set_state(ConnectionState::Connecting);
            tracing::info!(url = %self.ws_url, "Connecting to push WebSocket");

            let session_end = match connect_async(self.connect_url()).await {
                Ok((ws_stream, _response)) => {
                    tracing::info!("Push WebSocket connected");
                    self.set_state(ConnectionState::Open);
                    attempts = 0;
                    self.read_frames(ws_stream).await
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Push WebSocket connect failed");
                    SessionEnd::Failed
                }
            };

            match session_end {
                SessionEnd::Disposed => {
                    self.set_state(ConnectionState::Disconnected);
                    return;
                }
                SessionEnd::CleanClose => {
                    tracing::info!("Push WebSocket closed cleanly");
                    self.set_state(ConnectionState::Disconnected);
                    return;
                }
                SessionEnd::Failed => {
                    attempts += 1;
                    if attempts > MAX_RECONNECT_ATTEMPTS {
                        tracing::warn!(
                            attempts = attempts - 1,
                            "Giving up on the push WebSocket; too many consecutive failures",
                        );
                        self.set_state(ConnectionState::Disconnected);
                        return;
                    }

                    let delay = reconnect_delay(attempts);
                    tracing::warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Push WebSocket lost; reconnecting after delay",
                    );
                    self.set_state(ConnectionState::Reconnecting);
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            self.set_state(ConnectionState::Disconnected);
                            return;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Read one socket session until it ends.
    async fn read_frames(
        &self,
        mut ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ) -> SessionEnd {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = ws_stream
                        .close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "".into(),
                        }))
                        .await;
                    return SessionEnd::Disposed;
                }
                frame = ws_stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text),
                    Some(Ok(Message::Binary(_))) => {
                        tracing::trace!("Ignoring binary push frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let clean = matches!(
                            frame.as_ref().map(|f| f.code),
                            Some(CloseCode::Normal)
                        );
                        tracing::info!(?frame, "Push WebSocket closed by server");
                        return if clean {
                            SessionEnd::CleanClose
                        } else {
                            // Includes 1012 (service restart).
                            SessionEnd::Failed
                        };
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Push WebSocket receive error");
                        return SessionEnd::Failed;
                    }
                    None => {
                        tracing::info!("Push WebSocket stream exhausted");
                        return SessionEnd::Failed;
                    }
                }
            }
        }
    }

    /// Parse and dispatch one text frame.
    fn handle_text(&self, text: &str) {
        match parse_push_message(text) {
            Ok(PushMessage::PlotOpen(detail)) => {
                let _ = self.event_tx.send(PushEvent::PlotOpen(detail));
            }
            Ok(PushMessage::PlotUpdate(update)) => {
                let _ = self.event_tx.send(PushEvent::PlotUpdate(update));
            }
            Ok(PushMessage::PlotSold(detail)) => {
                let _ = self.event_tx.send(PushEvent::PlotSold(detail));
            }
            Ok(PushMessage::Ping) => {
                // Liveness only.
            }
            Err(e) => {
                tracing::warn!(error = %e, raw = %text, "Unknown or malformed push message");
            }
        }
    }
}
