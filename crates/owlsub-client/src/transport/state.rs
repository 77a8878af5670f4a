//! Published connection state and the read-only session handle.

use std::time::Duration;

use tokio::sync::watch;

use owlsub_core::error::{OwlSubError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// Welcome received. `migrated` is set when the session was reached by
    /// following a server-issued reconnect (subscriptions carry over).
    Connected { session_id: String, migrated: bool },
    /// Waiting `delay` before retry `attempt` against the default endpoint.
    Reconnecting { attempt: u32, delay: Duration },
    ShutDown,
}

impl ConnectionState {
    /// Current session id, empty unless a welcome has been processed.
    pub fn session_id(&self) -> &str {
        match self {
            ConnectionState::Connected { session_id, .. } => session_id,
            _ => "",
        }
    }
}

/// Read-only view of the supervisor's published state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<ConnectionState>,
}

impl SessionHandle {
    pub(crate) fn new(rx: watch::Receiver<ConnectionState>) -> Self {
        Self { rx }
    }

    pub fn state(&self) -> ConnectionState {
        self.rx.borrow().clone()
    }

    pub fn session_id(&self) -> String {
        self.rx.borrow().session_id().to_string()
    }

    /// Resolve with the session id once a welcome has been processed.
    ///
    /// Fails with `NotConnected` if the supervisor shuts down first.
    pub async fn wait_for_session(&mut self) -> Result<String> {
        loop {
            {
                let state = self.rx.borrow_and_update();
                match &*state {
                    ConnectionState::Connected { session_id, .. } => return Ok(session_id.clone()),
                    ConnectionState::ShutDown => return Err(OwlSubError::NotConnected),
                    _ => {}
                }
            }
            self.rx.changed().await.map_err(|_| OwlSubError::NotConnected)?;
        }
    }

    /// Wait for the next state change and return the new state.
    pub async fn changed(&mut self) -> Result<ConnectionState> {
        self.rx.changed().await.map_err(|_| OwlSubError::NotConnected)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}
