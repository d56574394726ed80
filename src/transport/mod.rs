//! Pluggable delivery sinks for exchange records.
//!
//! A transport accepts one immutable [`ExchangeRecord`] at a time and resolves
//! once the delivery attempt is known to have succeeded or failed. Transports
//! are independent of one another; the capture middleware treats the list as
//! opaque, already-thread-safe sinks and never holds a lock around them.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::{Config, ConnectFailurePolicy};
use crate::error::Result;
use crate::exchange::ExchangeRecord;

pub mod kafka;
pub mod log;

pub use kafka::KafkaTransport;
pub use log::LogTransport;

/// Lifecycle of a transport's connection to its sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

#[async_trait]
pub trait ExchangeTransport: Send + Sync + 'static {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Bring the transport into a usable state. Must complete successfully
    /// before the first `send`.
    async fn connect(&self) -> Result<()>;

    /// Attempt delivery of one record, resolving when the attempt is known to
    /// have succeeded or failed.
    async fn send(&self, record: &ExchangeRecord) -> Result<()>;

    /// Flush buffered records and release the connection. Undelivered records
    /// are reported, never silently discarded.
    async fn close(&self) -> Result<()>;
}

/// Assemble the transport list from configuration.
///
/// An empty list is legal: records are still built and then dropped.
pub fn create_transports(config: &Config) -> Vec<Arc<dyn ExchangeTransport>> {
    let mut transports: Vec<Arc<dyn ExchangeTransport>> = Vec::new();

    if config.capture.log_exchanges {
        transports.push(Arc::new(LogTransport::new()));
    }

    if config.kafka.enabled {
        transports.push(Arc::new(KafkaTransport::new(config.kafka.clone())));
    }

    transports
}

/// Connect every configured transport before the server starts accepting
/// traffic.
///
/// Under [`ConnectFailurePolicy::Fail`] the first connection failure aborts
/// bootstrap; under [`ConnectFailurePolicy::Degrade`] the failing transport is
/// dropped from the list and the server records through the remainder.
pub async fn connect_all(
    transports: Vec<Arc<dyn ExchangeTransport>>,
    policy: ConnectFailurePolicy,
) -> Result<Vec<Arc<dyn ExchangeTransport>>> {
    let mut connected = Vec::with_capacity(transports.len());

    for transport in transports {
        match transport.connect().await {
            Ok(()) => connected.push(transport),
            Err(e) => match policy {
                ConnectFailurePolicy::Fail => {
                    error!(transport = transport.name(), error = %e, "Transport failed to connect");
                    return Err(e);
                }
                ConnectFailurePolicy::Degrade => {
                    warn!(
                        transport = transport.name(),
                        error = %e,
                        "Transport failed to connect, serving without it"
                    );
                }
            },
        }
    }

    Ok(connected)
}

/// Close every transport, logging undelivered-record reports instead of
/// propagating them so shutdown always completes.
pub async fn close_all(transports: &[Arc<dyn ExchangeTransport>]) {
    for transport in transports {
        if let Err(e) = transport.close().await {
            warn!(transport = transport.name(), error = %e, "Transport close reported an error");
        }
    }
}
