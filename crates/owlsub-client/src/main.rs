//! owlsub: standalone EventSub listener.
//!
//! - Loads `owlsub.yaml` (or the path given as the first argument)
//! - Connects to EventSub and logs every notification
//! - Registers the configured subscriptions on each fresh session
//! - Ctrl-C shuts the supervisor down cleanly

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use owlsub_client::config::{self, SubscriptionSpec};
use owlsub_client::helix::{http_client, HelixClient};
use owlsub_client::{ConnectionState, CredentialProvider, EventSubClient, HandlerRegistry};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "owlsub.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");

    let http = http_client(HTTP_TIMEOUT).expect("http client");
    let credentials = Arc::new(CredentialProvider::new(http.clone(), cfg.helix.token_url.clone(), &cfg.twitch));
    let helix = HelixClient::new(http, cfg.helix.api_base.clone(), credentials);

    let registry = Arc::new(HandlerRegistry::new());
    registry.on_notification(|n| {
        tracing::info!(
            message_id = %n.message_id,
            subscription_type = %n.subscription.kind,
            event = %n.event,
            "eventsub notification"
        );
    });
    registry.on_revocation(|r| {
        tracing::warn!(
            subscription_type = %r.subscription.kind,
            status = %r.subscription.status,
            "eventsub subscription revoked"
        );
    });

    let client = EventSubClient::connect(cfg.eventsub.clone(), registry, helix)
        .await
        .expect("initial eventsub connect failed");

    let subscriber = tokio::spawn(keep_subscribed(client.clone(), cfg.subscriptions));

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
    client.shutdown().await;
    subscriber.abort();
    tracing::info!(metrics = %client.metrics().render(), "final counters");
}

/// Register the configured subscriptions whenever a fresh session is welcomed.
///
/// Sessions reached through a server-issued reconnect keep their subscriptions.
async fn keep_subscribed(client: EventSubClient, subscriptions: Vec<SubscriptionSpec>) {
    let mut session = client.session();
    let mut last = String::new();

    loop {
        if let ConnectionState::Connected { session_id, migrated } = session.state() {
            if !migrated && session_id != last {
                for sub in &subscriptions {
                    if let Err(e) = client
                        .helix()
                        .add_subscription_version(&session_id, &sub.kind, &sub.version, &sub.condition)
                        .await
                    {
                        tracing::error!(error = %e, code = e.kind().as_str(), subscription_type = %sub.kind, "subscription failed");
                    }
                }
            }
            last = session_id;
        }

        match session.changed().await {
            Ok(ConnectionState::ShutDown) | Err(_) => return,
            Ok(_) => {}
        }
    }
}
