//! Public handle for the EventSub connection.
//!
//! Cheap to clone; every clone talks to the same supervisor task. Handlers may
//! hold a clone and call back into it (e.g. spawn an `add_subscription`).

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use owlsub_core::error::{OwlSubError, Result};
use owlsub_core::protocol::SubscriptionType;

use crate::config::EventSubSection;
use crate::dispatch::HandlerRegistry;
use crate::helix::HelixClient;
use crate::obs::ClientMetrics;
use crate::transport::state::{ConnectionState, SessionHandle};
use crate::transport::ws::{dial, Supervisor};

#[derive(Clone)]
pub struct EventSubClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    registry: Arc<HandlerRegistry>,
    helix: HelixClient,
    session: SessionHandle,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<ClientMetrics>,
}

impl EventSubClient {
    /// Open the first connection and start the supervisor.
    ///
    /// A failure here is returned to the caller. Automatic retry only applies
    /// to sessions that were established and later dropped.
    pub async fn connect(
        settings: EventSubSection,
        registry: Arc<HandlerRegistry>,
        helix: HelixClient,
    ) -> Result<Self> {
        tracing::info!(url = %settings.url, "connecting to twitch eventsub");
        let ws = dial(&settings.url, settings.connect_timeout()).await?;

        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let shutdown = CancellationToken::new();
        let metrics = Arc::new(ClientMetrics::default());

        let supervisor = Supervisor::new(
            settings,
            Arc::clone(&registry),
            state_tx,
            shutdown.clone(),
            Arc::clone(&metrics),
        );
        let task = tokio::spawn(supervisor.run(ws));

        Ok(Self {
            inner: Arc::new(ClientInner {
                registry,
                helix,
                session: SessionHandle::new(state_rx),
                shutdown,
                task: Mutex::new(Some(task)),
                metrics,
            }),
        })
    }

    pub fn registry(&self) -> Arc<HandlerRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn session(&self) -> SessionHandle {
        self.inner.session.clone()
    }

    /// Current session id; empty until a welcome has been processed.
    pub fn session_id(&self) -> String {
        self.inner.session.session_id()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.session.state()
    }

    pub fn metrics(&self) -> Arc<ClientMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn helix(&self) -> &HelixClient {
        &self.inner.helix
    }

    /// Register interest in `kind` on the current session.
    ///
    /// Returns `NotConnected` without any network call if no session has been
    /// welcomed.
    pub async fn add_subscription(
        &self,
        kind: &SubscriptionType,
        condition: &BTreeMap<String, String>,
    ) -> Result<()> {
        let session_id = self.session_id();
        if session_id.is_empty() {
            return Err(OwlSubError::NotConnected);
        }
        self.inner.helix.add_subscription(&session_id, kind, condition).await
    }

    /// Cancel the supervisor, close the active socket, and wait for the task to end.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let task = self.inner.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "eventsub supervisor task failed");
            }
        }
    }
}
