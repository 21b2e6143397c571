//! Redis notifier - connection outage and recovery alerts for chat webhooks
//!
//! Subscribes to a connection's `error`, `connect` and `ready` events and posts
//! one alert when the connection goes down and one when it comes back.

pub mod config;
pub mod error;
pub mod events;
pub mod io;
pub mod notifier;
pub mod probe;
pub mod webhook;

pub use config::{load_config, Config};
pub use error::{NotifierError, Result};
pub use events::{ConnectionEvents, LifecycleEmitter, LifecycleEvent, Subscription};
pub use notifier::{ConnectionHealth, ConnectionNotifier};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::io::ReqwestHttpClient;
use crate::probe::RedisProbe;

/// Run the notifier service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let http: Arc<dyn io::HttpClient> =
        Arc::new(ReqwestHttpClient::with_timeout(config.webhook.timeout())?);
    let emitter = LifecycleEmitter::new();
    let notifier = ConnectionNotifier::from_config(&emitter, &config, http)?;
    let probe = RedisProbe::new(&config.redis, emitter.clone());
    let cancel = CancellationToken::new();

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    tracing::info!(
        "Watching redis '{}' at {}",
        notifier.host(),
        config.redis.address
    );

    // Blocks until cancelled
    probe.run(cancel).await;

    notifier.detach();
    emitter.close();
    tracing::info!("Redis notifier stopped");

    Ok(())
}
