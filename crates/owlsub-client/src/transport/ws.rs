//! EventSub connection supervisor.
//!
//! Single-owner actor: one task owns the socket, the decoder (and with it the
//! recent-message window), and the backoff. Everyone else only observes the
//! published `ConnectionState` or cancels the root token.
//!
//! Per session:
//! - read one frame at a time; answer transport pings with pongs
//! - text frames => decoder => registry dispatch, strictly in arrival order
//! - welcome: publish session id, reset backoff, arm the keepalive watchdog
//! - reconnect: close this socket, then dial the server-supplied URL
//! - read error / close / silence: close, then retry the default URL with backoff
//!
//! The old socket is always closed before the next one is dialed, so there is
//! never more than one reader dispatching into the registry.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use owlsub_core::error::{DecodeError, OwlSubError, Result};
use owlsub_core::protocol::{EnvelopeDecoder, Event, WelcomeEvent};

use crate::config::EventSubSection;
use crate::dispatch::HandlerRegistry;
use crate::obs::ClientMetrics;
use crate::transport::backoff::Backoff;
use crate::transport::codec::{classify, Inbound};
use crate::transport::state::ConnectionState;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Silence budget before the first welcome announces the real one.
const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Open a websocket to `url`.
pub(crate) async fn dial(url: &str, timeout: Duration) -> Result<WsStream> {
    let (ws, _resp) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .map_err(|_| OwlSubError::Connect(format!("connect to {url} timed out")))?
        .map_err(|e| OwlSubError::Connect(format!("connect to {url} failed: {e}")))?;
    Ok(ws)
}

enum SessionEnd {
    Shutdown,
    Dropped(String),
    Reconnect(String),
}

enum Dial {
    Connected(WsStream),
    Failed(OwlSubError),
    Shutdown,
}

pub(crate) struct Supervisor {
    settings: EventSubSection,
    decoder: EnvelopeDecoder,
    backoff: Backoff,
    registry: Arc<HandlerRegistry>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown: CancellationToken,
    metrics: Arc<ClientMetrics>,
}

impl Supervisor {
    pub(crate) fn new(
        settings: EventSubSection,
        registry: Arc<HandlerRegistry>,
        state_tx: watch::Sender<ConnectionState>,
        shutdown: CancellationToken,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            decoder: EnvelopeDecoder::new(settings.dedup_window, settings.max_message_age()),
            backoff: Backoff::new(settings.backoff_floor(), settings.backoff_ceiling()),
            settings,
            registry,
            state_tx,
            shutdown,
            metrics,
        }
    }

    /// Drive sessions until the root token is cancelled.
    pub(crate) async fn run(mut self, first: WsStream) {
        let mut ws = first;
        let mut migrated = false;

        loop {
            let session_cancel = self.shutdown.child_token();
            let end = self.run_session(ws, &session_cancel, migrated).await;
            session_cancel.cancel();

            let next = match end {
                SessionEnd::Shutdown => break,
                SessionEnd::Reconnect(url) => {
                    self.metrics.reconnects.inc(&[("cause", "server")]);
                    tracing::info!(%url, "eventsub requested reconnect");
                    self.publish(ConnectionState::Connecting);
                    match self.dial_or_shutdown(&url).await {
                        Dial::Connected(ws) => Some(ws),
                        Dial::Shutdown => break,
                        Dial::Failed(e) => {
                            tracing::warn!(error = %e, "reconnect url failed, falling back to default endpoint");
                            None
                        }
                    }
                }
                SessionEnd::Dropped(reason) => {
                    self.metrics.reconnects.inc(&[("cause", "dropped")]);
                    tracing::warn!(%reason, "eventsub session dropped");
                    self.publish(ConnectionState::Disconnected);
                    None
                }
            };

            ws = match next {
                Some(ws) => {
                    migrated = true;
                    ws
                }
                None => {
                    migrated = false;
                    match self.retry_default().await {
                        Some(ws) => ws,
                        None => break,
                    }
                }
            };
        }

        self.publish(ConnectionState::ShutDown);
        tracing::info!("eventsub supervisor stopped");
    }

    async fn run_session(
        &mut self,
        mut ws: WsStream,
        cancel: &CancellationToken,
        migrated: bool,
    ) -> SessionEnd {
        let grace = self.settings.keepalive_grace();
        let mut silence_budget = DEFAULT_KEEPALIVE.saturating_add(grace);

        let end = loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => None,
                next = tokio::time::timeout(silence_budget, ws.next()) => Some(next),
            };
            let Some(next) = next else {
                break SessionEnd::Shutdown;
            };

            let msg = match next {
                Err(_) => break SessionEnd::Dropped(format!("no frame within {silence_budget:?}")),
                Ok(None) => break SessionEnd::Dropped("stream ended".into()),
                Ok(Some(Err(e))) => break SessionEnd::Dropped(format!("read error: {e}")),
                Ok(Some(Ok(msg))) => msg,
            };

            match classify(msg) {
                Inbound::Ping(payload) => {
                    if let Err(e) = ws.send(Message::Pong(payload)).await {
                        break SessionEnd::Dropped(format!("pong failed: {e}"));
                    }
                }
                Inbound::Pong => {}
                Inbound::Close(reason) => {
                    break SessionEnd::Dropped(format!(
                        "closed by server: {}",
                        reason.unwrap_or_default()
                    ));
                }
                Inbound::Other(kind) => tracing::debug!(kind, "ignoring non-text eventsub frame"),
                Inbound::Text(text) => {
                    let Some(event) = self.decode(&text) else {
                        continue;
                    };

                    match &event {
                        Event::Welcome(w) => {
                            if let Some(timeout) = w.keepalive_timeout() {
                                silence_budget = timeout.saturating_add(grace);
                            }
                            self.on_welcome(w, migrated);
                        }
                        Event::Keepalive(_) => tracing::debug!("eventsub keepalive"),
                        _ => {}
                    }

                    self.dispatch(&event);

                    if let Event::Reconnect(r) = event {
                        break SessionEnd::Reconnect(r.reconnect_url().to_string());
                    }
                }
            }
        };

        // Bounded: a dead peer must not stall the swap to the next socket.
        let _ = tokio::time::timeout(CLOSE_TIMEOUT, ws.close(None)).await;
        end
    }

    fn decode(&mut self, text: &str) -> Option<Event> {
        self.metrics.frames.inc(&[]);
        match self.decoder.parse(text.as_bytes()) {
            Ok(event) => Some(event),
            Err(e) => {
                self.metrics.decode_drops.inc(&[("reason", e.reason())]);
                match &e {
                    DecodeError::DuplicateEvent(id) => {
                        tracing::debug!(message_id = %id, "dropping duplicate eventsub message")
                    }
                    DecodeError::UnknownMessageType(t) => {
                        tracing::info!(message_type = %t, "unimplemented eventsub message type")
                    }
                    _ => tracing::warn!(error = %e, reason = e.reason(), "failed to parse eventsub message"),
                }
                None
            }
        }
    }

    fn on_welcome(&mut self, w: &WelcomeEvent, migrated: bool) {
        tracing::info!(session_id = w.session_id(), migrated, "connected to twitch eventsub");
        self.backoff.reset();
        self.publish(ConnectionState::Connected {
            session_id: w.session_id().to_string(),
            migrated,
        });
    }

    fn dispatch(&self, event: &Event) {
        let report = self.registry.dispatch(event);
        if report.panicked > 0 {
            self.metrics
                .handler_panics
                .add(&[("kind", event.kind().as_str())], report.panicked as u64);
        }
    }

    /// Retry the default endpoint until a dial succeeds or shutdown is requested.
    async fn retry_default(&mut self) -> Option<WsStream> {
        let url = self.settings.url.clone();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            let delay = self.backoff.current();
            self.publish(ConnectionState::Reconnecting { attempt, delay });
            tracing::warn!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "eventsub disconnected, waiting before reconnecting"
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            self.publish(ConnectionState::Connecting);
            match self.dial_or_shutdown(&url).await {
                Dial::Connected(ws) => {
                    self.backoff.reset();
                    return Some(ws);
                }
                Dial::Shutdown => return None,
                Dial::Failed(e) => {
                    tracing::error!(error = %e, attempt, "error reconnecting to twitch eventsub");
                    self.backoff.on_failure();
                }
            }
        }
    }

    async fn dial_or_shutdown(&self, url: &str) -> Dial {
        tokio::select! {
            _ = self.shutdown.cancelled() => Dial::Shutdown,
            res = dial(url, self.settings.connect_timeout()) => match res {
                Ok(ws) => Dial::Connected(ws),
                Err(e) => Dial::Failed(e),
            },
        }
    }

    fn publish(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }
}
