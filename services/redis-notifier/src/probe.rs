//! Redis liveness probe
//!
//! Plays the part of the connection client for the standalone service: it
//! keeps one TCP connection to Redis, checks it with `PING` on every tick and
//! reports what it sees as lifecycle events on a [`LifecycleEmitter`].

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::RedisConfig;
use crate::events::{LifecycleEmitter, LifecycleEvent};

/// Result of a single probe tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A new connection was opened and answered `PING`
    Ready,
    /// The existing connection answered `PING`
    Alive,
    /// The TCP connection could not be opened
    ConnectFailed,
    /// The connection was open but `PING` failed; it has been dropped
    PingFailed,
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Ready | ProbeOutcome::Alive)
    }
}

pub struct RedisProbe {
    address: String,
    polling_interval: Duration,
    connect_timeout: Duration,
    emitter: LifecycleEmitter,
    connection: Mutex<Option<BufStream<TcpStream>>>,
}

impl std::fmt::Debug for RedisProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisProbe")
            .field("address", &self.address)
            .field("polling_interval", &self.polling_interval)
            .finish()
    }
}

impl RedisProbe {
    pub fn new(config: &RedisConfig, emitter: LifecycleEmitter) -> Self {
        tracing::debug!(
            "Created RedisProbe for {} (every {:?})",
            config.address,
            config.polling_interval()
        );
        Self {
            address: config.address.clone(),
            polling_interval: config.polling_interval(),
            connect_timeout: config.connect_timeout(),
            emitter,
            connection: Mutex::new(None),
        }
    }

    /// Probe until `cancel` fires. Each tick waits for every listener of the
    /// events it emits, so a slow webhook delays the next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("Probing redis at {}", self.address);
        loop {
            let outcome = self.probe().await;
            tracing::trace!("Probe of {}: {:?}", self.address, outcome);

            tokio::select! {
                _ = tokio::time::sleep(self.polling_interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Probe loop for {} cancelled", self.address);
                    break;
                }
            }
        }
        *self.connection.lock().await = None;
    }

    /// Run one probe tick and emit the resulting lifecycle events
    pub async fn probe(&self) -> ProbeOutcome {
        let (outcome, events) = self.check().await;
        for event in events {
            self.emitter.emit(event).await;
        }
        outcome
    }

    async fn check(&self) -> (ProbeOutcome, Vec<LifecycleEvent>) {
        let mut connection = self.connection.lock().await;
        let mut events = Vec::new();

        let fresh = connection.is_none();
        if fresh {
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
                .await
            {
                Ok(Ok(stream)) => {
                    tracing::debug!("Connected to redis at {}", self.address);
                    *connection = Some(BufStream::new(stream));
                }
                Ok(Err(e)) => {
                    tracing::warn!("Failed to connect to redis at {}: {}", self.address, e);
                    events.push(LifecycleEvent::Error);
                    return (ProbeOutcome::ConnectFailed, events);
                }
                Err(_) => {
                    tracing::warn!(
                        "Connecting to redis at {} timed out after {:?}",
                        self.address,
                        self.connect_timeout
                    );
                    events.push(LifecycleEvent::Error);
                    return (ProbeOutcome::ConnectFailed, events);
                }
            }
        }

        let Some(stream) = connection.as_mut() else {
            return (ProbeOutcome::ConnectFailed, events);
        };

        let result = match tokio::time::timeout(self.connect_timeout, ping(stream)).await {
            Ok(result) => result,
            Err(_) => Err(crate::NotifierError::Probe(format!(
                "PING timed out after {:?}",
                self.connect_timeout
            ))),
        };

        match result {
            // A new connection only counts once it has answered PING
            Ok(()) if fresh => {
                events.push(LifecycleEvent::Connect);
                events.push(LifecycleEvent::Ready);
                (ProbeOutcome::Ready, events)
            }
            Ok(()) => (ProbeOutcome::Alive, events),
            Err(e) => {
                tracing::warn!("Redis at {} failed health check: {}", self.address, e);
                *connection = None;
                events.push(LifecycleEvent::Error);
                (ProbeOutcome::PingFailed, events)
            }
        }
    }
}

async fn ping(stream: &mut BufStream<TcpStream>) -> crate::Result<()> {
    stream.write_all(b"PING\r\n").await?;
    stream.flush().await?;

    let mut line = String::new();
    let read = stream.read_line(&mut line).await?;
    if read == 0 {
        return Err(crate::NotifierError::Probe(
            "connection closed by server".to_string(),
        ));
    }

    let reply = line.trim_end();
    if reply.starts_with("+PONG") {
        Ok(())
    } else {
        Err(crate::NotifierError::Probe(format!(
            "unexpected reply to PING: {}",
            reply
        )))
    }
}
