//! Connection lifecycle events and the subscription capability
//!
//! A connection handle is anything that can register a listener for a named
//! lifecycle event. [`LifecycleEmitter`] is the in-process implementation used
//! by the Redis probe and by tests.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// A lifecycle signal emitted by a connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Error,
    Connect,
    Ready,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 3] = [
        LifecycleEvent::Error,
        LifecycleEvent::Connect,
        LifecycleEvent::Ready,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Error => "error",
            LifecycleEvent::Connect => "connect",
            LifecycleEvent::Ready => "ready",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = crate::NotifierError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "error" => Ok(LifecycleEvent::Error),
            "connect" => Ok(LifecycleEvent::Connect),
            "ready" => Ok(LifecycleEvent::Ready),
            other => Err(crate::NotifierError::Config(format!(
                "Unknown lifecycle event '{}'",
                other
            ))),
        }
    }
}

/// Future returned by a listener invocation
pub type ListenerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback registered for a lifecycle event. Event payloads are not forwarded.
pub type Listener = Arc<dyn Fn() -> ListenerFuture + Send + Sync>;

/// Capability to subscribe to named lifecycle events
pub trait ConnectionEvents: Send + Sync {
    /// Register `listener` for `event`, returning a handle that can remove it again
    fn subscribe(&self, event: LifecycleEvent, listener: Listener) -> crate::Result<Subscription>;
}

/// Registration handle returned by [`ConnectionEvents::subscribe`]
///
/// Dropping the handle leaves the listener registered. Call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    event: LifecycleEvent,
    id: u64,
    revoke: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(event: LifecycleEvent, id: u64, revoke: impl FnOnce() + Send + 'static) -> Self {
        Self {
            event,
            id,
            revoke: Some(Box::new(revoke)),
        }
    }

    pub fn event(&self) -> LifecycleEvent {
        self.event
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.revoke.is_some()
    }

    /// Remove the listener from its handle. Calling this twice is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(revoke) = self.revoke.take() {
            tracing::debug!("Removing '{}' listener #{}", self.event, self.id);
            revoke();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    closed: bool,
    entries: Vec<(u64, LifecycleEvent, Listener)>,
}

/// In-process lifecycle event emitter
///
/// Cloning yields another handle onto the same listener registry.
#[derive(Clone, Default)]
pub struct LifecycleEmitter {
    registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for LifecycleEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("LifecycleEmitter")
            .field("listeners", &registry.entries.len())
            .field("closed", &registry.closed)
            .finish()
    }
}

impl LifecycleEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke every listener registered for `event`, in registration order.
    ///
    /// Listeners are awaited one after another, so a slow webhook delivery
    /// holds up the caller until the HTTP client times out. Returns how many ran.
    pub async fn emit(&self, event: LifecycleEvent) -> usize {
        let listeners: Vec<Listener> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .entries
                .iter()
                .filter(|(_, e, _)| *e == event)
                .map(|(_, _, listener)| Arc::clone(listener))
                .collect()
        };

        tracing::trace!("Emitting '{}' to {} listener(s)", event, listeners.len());
        for listener in &listeners {
            listener().await;
        }
        listeners.len()
    }

    /// Number of listeners currently registered for `event`
    pub fn listener_count(&self, event: LifecycleEvent) -> usize {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.entries.iter().filter(|(_, e, _)| *e == event).count()
    }

    /// Drop all listeners and refuse new subscriptions
    pub fn close(&self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.closed = true;
        registry.entries.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}

impl ConnectionEvents for LifecycleEmitter {
    fn subscribe(&self, event: LifecycleEvent, listener: Listener) -> crate::Result<Subscription> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if registry.closed {
            return Err(crate::NotifierError::Config(format!(
                "cannot subscribe to '{}' on a closed emitter",
                event
            )));
        }

        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, event, listener));

        let weak: Weak<Mutex<Registry>> = Arc::downgrade(&self.registry);
        Ok(Subscription::new(event, id, move || {
            if let Some(registry) = weak.upgrade() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entries
                    .retain(|(entry_id, _, _)| *entry_id != id);
            }
        }))
    }
}
