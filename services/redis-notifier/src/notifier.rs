//! Connection notifier: turns lifecycle events into deduplicated webhook alerts
//!
//! The notifier keeps a single flag recording whether a failure alert has been
//! delivered for the current outage. The first `error` event of an outage posts
//! a failure alert, later `error` events are ignored until a `connect` or
//! `ready` event posts the recovery alert and clears the flag.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::Config;
use crate::events::{ConnectionEvents, LifecycleEvent, Listener, ListenerFuture, Subscription};
use crate::io::HttpClient;
use crate::webhook::{AlertSender, DeliveryReceipt, WebhookTarget};

pub const INVALID_CONNECTION_MESSAGE: &str = "Redis instance isn't valid. Please verify again.";

/// Health of the monitored connection as seen by the notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    Healthy,
    Degraded,
}

impl fmt::Display for ConnectionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionHealth::Healthy => write!(f, "Healthy"),
            ConnectionHealth::Degraded => write!(f, "Degraded"),
        }
    }
}

struct NotifierInner {
    sender: AlertSender,
    // Held across alert delivery so handler runs never interleave.
    has_error_occurred: tokio::sync::Mutex<bool>,
}

impl NotifierInner {
    async fn handle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Error => self.on_error().await,
            LifecycleEvent::Connect | LifecycleEvent::Ready => self.on_recovered(event).await,
        }
    }

    async fn on_error(&self) {
        let mut has_error_occurred = self.has_error_occurred.lock().await;
        if *has_error_occurred {
            tracing::debug!(
                "Failure alert for '{}' already sent, ignoring repeated error event",
                self.sender.host()
            );
            return;
        }

        match self.sender.send_alert(false).await {
            Ok(receipt) => {
                tracing::info!(
                    "Sent failure alert for '{}' (status {})",
                    self.sender.host(),
                    receipt.status
                );
                *has_error_occurred = true;
            }
            Err(e) => {
                // The connection keeps retrying on its own; the next error event tries again.
                tracing::warn!(
                    "Failed to deliver failure alert for '{}': {}",
                    self.sender.host(),
                    e
                );
            }
        }
    }

    async fn on_recovered(&self, event: LifecycleEvent) {
        let mut has_error_occurred = self.has_error_occurred.lock().await;
        if *has_error_occurred {
            match self.sender.send_alert(true).await {
                Ok(receipt) => tracing::info!(
                    "Sent recovery alert for '{}' (status {})",
                    self.sender.host(),
                    receipt.status
                ),
                Err(e) => tracing::warn!(
                    "Failed to deliver recovery alert for '{}': {}",
                    self.sender.host(),
                    e
                ),
            }
        }
        *has_error_occurred = false;

        match event {
            LifecycleEvent::Ready => tracing::info!(
                "Ready to connect because a connection has been established to '{}'",
                self.sender.host()
            ),
            _ => tracing::info!(
                "Successfully connected to the redis instance '{}'",
                self.sender.host()
            ),
        }
    }
}

/// Watches one connection handle and posts outage/recovery alerts
pub struct ConnectionNotifier {
    inner: Arc<NotifierInner>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl fmt::Debug for ConnectionNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionNotifier")
            .field("sender", &self.inner.sender)
            .finish()
    }
}

impl ConnectionNotifier {
    /// Validate the webhook URL and subscribe to `error`, `connect` and `ready`
    /// on `connection`.
    ///
    /// Listeners stay registered for the lifetime of the connection handle,
    /// even if the notifier is dropped, unless [`ConnectionNotifier::detach`]
    /// is called.
    pub fn new(
        connection: &dyn ConnectionEvents,
        webhook_url: Option<&str>,
        host: impl Into<String>,
        http: Arc<dyn HttpClient>,
    ) -> crate::Result<Self> {
        let target = WebhookTarget::parse(webhook_url)?;
        let inner = Arc::new(NotifierInner {
            sender: AlertSender::new(target, host, http),
            has_error_occurred: tokio::sync::Mutex::new(false),
        });

        let mut subscriptions = Vec::with_capacity(LifecycleEvent::ALL.len());
        for event in LifecycleEvent::ALL {
            match connection.subscribe(event, listener(&inner, event)) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(e) => {
                    tracing::debug!("Subscribing to '{}' failed: {}", event, e);
                    for mut subscription in subscriptions {
                        subscription.unsubscribe();
                    }
                    return Err(crate::NotifierError::Config(
                        INVALID_CONNECTION_MESSAGE.to_string(),
                    ));
                }
            }
        }

        tracing::debug!(
            "Created ConnectionNotifier for '{}' posting to {}",
            inner.sender.host(),
            inner.sender.target()
        );

        Ok(Self {
            inner,
            subscriptions: Mutex::new(subscriptions),
        })
    }

    /// Build a notifier from the `webhook` and `host` sections of a config
    pub fn from_config(
        connection: &dyn ConnectionEvents,
        config: &Config,
        http: Arc<dyn HttpClient>,
    ) -> crate::Result<Self> {
        Self::new(
            connection,
            config.webhook.url.as_deref(),
            config.host.clone(),
            http,
        )
    }

    pub fn host(&self) -> &str {
        self.inner.sender.host()
    }

    pub fn webhook_target(&self) -> &WebhookTarget {
        self.inner.sender.target()
    }

    pub fn format_message(&self, is_successful: bool) -> String {
        self.inner.sender.format_message(is_successful)
    }

    /// Post a single alert without touching the notifier state
    pub async fn send_alert(&self, is_successful: bool) -> crate::Result<DeliveryReceipt> {
        self.inner.sender.send_alert(is_successful).await
    }

    pub async fn on_error(&self) {
        self.inner.on_error().await;
    }

    pub async fn on_connect(&self) {
        self.inner.on_recovered(LifecycleEvent::Connect).await;
    }

    pub async fn on_ready(&self) {
        self.inner.on_recovered(LifecycleEvent::Ready).await;
    }

    /// True while a failure alert has been delivered and no recovery seen yet
    pub async fn has_error_occurred(&self) -> bool {
        *self.inner.has_error_occurred.lock().await
    }

    pub async fn health(&self) -> ConnectionHealth {
        if self.has_error_occurred().await {
            ConnectionHealth::Degraded
        } else {
            ConnectionHealth::Healthy
        }
    }

    /// Remove this notifier's listeners from the connection handle.
    ///
    /// Returns how many listeners were removed; a second call returns 0.
    pub fn detach(&self) -> usize {
        let drained: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let count = drained.len();
        for mut subscription in drained {
            subscription.unsubscribe();
        }
        if count > 0 {
            tracing::debug!("Detached notifier for '{}'", self.host());
        }
        count
    }
}

fn listener(inner: &Arc<NotifierInner>, event: LifecycleEvent) -> Listener {
    let inner = Arc::clone(inner);
    Arc::new(move || -> ListenerFuture {
        let inner = Arc::clone(&inner);
        Box::pin(async move { inner.handle(event).await })
    })
}
