use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;

use owlsub_core::protocol::{
    Event, EventKind, KeepaliveEvent, NotificationEvent, ReconnectEvent, RevocationEvent,
    WelcomeEvent,
};

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned normally.
    pub delivered: usize,
    /// Handlers that panicked (isolated; later handlers still ran).
    pub panicked: usize,
}

/// Append-only callback table keyed by event kind.
///
/// Registration is typed per variant; each stored handler only ever sees the
/// variant it was registered for.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<EventKind, Vec<Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn on_welcome(&self, f: impl Fn(&WelcomeEvent) + Send + Sync + 'static) {
        self.register(EventKind::Welcome, move |ev| {
            if let Event::Welcome(w) = ev {
                f(w)
            }
        });
    }

    pub fn on_keepalive(&self, f: impl Fn(&KeepaliveEvent) + Send + Sync + 'static) {
        self.register(EventKind::Keepalive, move |ev| {
            if let Event::Keepalive(k) = ev {
                f(k)
            }
        });
    }

    pub fn on_reconnect(&self, f: impl Fn(&ReconnectEvent) + Send + Sync + 'static) {
        self.register(EventKind::Reconnect, move |ev| {
            if let Event::Reconnect(r) = ev {
                f(r)
            }
        });
    }

    pub fn on_notification(&self, f: impl Fn(&NotificationEvent) + Send + Sync + 'static) {
        self.register(EventKind::Notification, move |ev| {
            if let Event::Notification(n) = ev {
                f(n)
            }
        });
    }

    pub fn on_revocation(&self, f: impl Fn(&RevocationEvent) + Send + Sync + 'static) {
        self.register(EventKind::Revocation, move |ev| {
            if let Event::Revocation(r) = ev {
                f(r)
            }
        });
    }

    fn register(&self, kind: EventKind, handler: impl Fn(&Event) + Send + Sync + 'static) {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map(|h| h.len()).unwrap_or(0)
    }

    /// Invoke every handler registered for the event's kind, in registration order.
    ///
    /// A panicking handler is logged and skipped. No handlers is a no-op.
    pub fn dispatch(&self, event: &Event) -> DispatchReport {
        let kind = event.kind();
        // Snapshot so handlers may register more handlers without deadlocking.
        let handlers: Vec<Handler> = match self.handlers.get(&kind) {
            Some(h) => h.value().clone(),
            None => return DispatchReport::default(),
        };

        let mut report = DispatchReport::default();
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => report.delivered += 1,
                Err(_) => {
                    report.panicked += 1;
                    tracing::error!(kind = kind.as_str(), "eventsub handler panicked");
                }
            }
        }
        report
    }
}
