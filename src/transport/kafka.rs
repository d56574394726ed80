//! Kafka producer transport.
//!
//! Publishes serialized exchange records to a fixed topic through an rdkafka
//! `FutureProducer`. The connection lifecycle is modeled as an explicit state
//! (`Disconnected → Connecting → Connected → Closing → Disconnected`) so a
//! `send` before `connect` is a detectable usage error instead of silent data
//! loss. Records carry no partitioning key; ordering falls back to the
//! broker's default. The core does not retry a failed publish — rdkafka's own
//! `message.send.max.retries` applies underneath, making an accepted enqueue
//! at-least-once and each `send` attempt best-effort.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use super::{ConnectionState, ExchangeTransport};
use crate::config::KafkaConfig;
use crate::error::{Result, TransportError};
use crate::exchange::ExchangeRecord;

struct Inner {
    state: ConnectionState,
    producer: Option<FutureProducer>,
}

pub struct KafkaTransport {
    config: KafkaConfig,
    inner: RwLock<Inner>,
}

impl KafkaTransport {
    pub fn new(config: KafkaConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                state: ConnectionState::Disconnected,
                producer: None,
            }),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    /// Build the producer and verify broker reachability by fetching topic
    /// metadata within the connect timeout.
    async fn establish(&self) -> Result<FutureProducer> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", self.config.brokers.join(","))
            .set(
                "message.timeout.ms",
                self.config.message_timeout_ms.to_string(),
            )
            .create()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let probe = producer.clone();
        let topic = self.config.topic.clone();
        let timeout = Duration::from_millis(self.config.connect_timeout_ms);

        // fetch_metadata blocks up to the timeout.
        tokio::task::spawn_blocking(move || {
            probe.client().fetch_metadata(Some(&topic), timeout)
        })
        .await
        .map_err(|e| TransportError::ConnectionFailed(format!("metadata probe task failed: {e}")))?
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(producer)
    }
}

#[async_trait]
impl ExchangeTransport for KafkaTransport {
    fn name(&self) -> &str {
        "kafka"
    }

    async fn connect(&self) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            if inner.state == ConnectionState::Connected {
                return Ok(());
            }
            inner.state = ConnectionState::Connecting;
        }

        debug!(
            brokers = %self.config.brokers.join(","),
            topic = %self.config.topic,
            "Connecting Kafka producer"
        );

        match self.establish().await {
            Ok(producer) => {
                let mut inner = self.inner.write().await;
                inner.producer = Some(producer);
                inner.state = ConnectionState::Connected;
                info!(topic = %self.config.topic, "Kafka producer connected");
                Ok(())
            }
            Err(e) => {
                let mut inner = self.inner.write().await;
                inner.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    async fn send(&self, record: &ExchangeRecord) -> Result<()> {
        let producer = {
            let inner = self.inner.read().await;
            if inner.state != ConnectionState::Connected {
                return Err(TransportError::NotConnected.into());
            }
            inner
                .producer
                .clone()
                .ok_or(TransportError::NotConnected)?
        };

        let payload = serde_json::to_vec(record)
            .map_err(|e| TransportError::SendFailed(format!("serialization failed: {e}")))?;

        // Synchronous enqueue keeps per-producer submission order equal to the
        // order send was called; the delivery future resolves once the broker
        // has accepted or rejected the message.
        let delivery = producer
            .send_result(FutureRecord::<(), _>::to(&self.config.topic).payload(&payload))
            .map_err(|(e, _)| TransportError::SendFailed(e.to_string()))?;

        match delivery.await {
            Ok(Ok((partition, offset))) => {
                trace!(
                    topic = %self.config.topic,
                    partition,
                    offset,
                    "Exchange record published"
                );
                Ok(())
            }
            Ok(Err((e, _))) => Err(TransportError::SendFailed(e.to_string()).into()),
            Err(_) => Err(TransportError::SendFailed("delivery future canceled".into()).into()),
        }
    }

    async fn close(&self) -> Result<()> {
        let producer = {
            let mut inner = self.inner.write().await;
            if inner.state == ConnectionState::Disconnected {
                return Ok(());
            }
            inner.state = ConnectionState::Closing;
            inner.producer.take()
        };

        let result = match producer {
            Some(producer) => {
                let timeout = Duration::from_millis(self.config.flush_timeout_ms);
                tokio::task::spawn_blocking(move || {
                    let flushed = producer.flush(Timeout::After(timeout));
                    (flushed, producer.in_flight_count())
                })
                .await
                .map_err(|e| {
                    TransportError::SendFailed(format!("flush task failed: {e}")).into()
                })
                .and_then(|(flushed, in_flight)| match flushed {
                    Ok(()) => {
                        info!(topic = %self.config.topic, "Kafka producer flushed and closed");
                        Ok(())
                    }
                    Err(e) => {
                        let undelivered = in_flight.max(0) as usize;
                        warn!(
                            topic = %self.config.topic,
                            undelivered,
                            error = %e,
                            "Kafka flush did not drain all records"
                        );
                        Err(TransportError::FlushIncomplete { undelivered }.into())
                    }
                })
            }
            None => Ok(()),
        };

        self.inner.write().await.state = ConnectionState::Disconnected;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecorderError;
    use crate::exchange::PendingExchange;
    use bytes::Bytes;
    use http::{Request, Response};

    fn sample_record() -> ExchangeRecord {
        let (req_parts, _) = Request::builder()
            .method("GET")
            .uri("/")
            .body(())
            .unwrap()
            .into_parts();
        let (resp_parts, _) = Response::builder().status(200).body(()).unwrap().into_parts();
        PendingExchange::begin(&req_parts, Bytes::new()).complete(&resp_parts, Bytes::new())
    }

    fn test_config() -> KafkaConfig {
        KafkaConfig {
            enabled: true,
            brokers: vec!["127.0.0.1:1".to_string()],
            topic: "http_recordings".to_string(),
            connect_timeout_ms: 1500,
            flush_timeout_ms: 500,
            message_timeout_ms: 500,
        }
    }

    #[tokio::test]
    async fn test_send_before_connect_is_a_reported_error() {
        let transport = KafkaTransport::new(test_config());

        let result = transport.send(&sample_record()).await;

        assert!(matches!(
            result,
            Err(RecorderError::Transport(TransportError::NotConnected))
        ));
        assert_eq!(transport.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_close_without_connect_is_a_no_op() {
        let transport = KafkaTransport::new(test_config());

        assert!(transport.close().await.is_ok());
        assert_eq!(transport.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_broker_fails_and_resets_state() {
        let transport = KafkaTransport::new(test_config());

        let result = transport.connect().await;

        assert!(matches!(
            result,
            Err(RecorderError::Transport(TransportError::ConnectionFailed(_)))
        ));
        assert_eq!(transport.state().await, ConnectionState::Disconnected);
    }

    // Requires a reachable broker on localhost:9092.
    #[tokio::test]
    #[ignore]
    async fn test_connect_send_close_against_live_broker() {
        let config = KafkaConfig {
            brokers: vec!["localhost:9092".to_string()],
            connect_timeout_ms: 10_000,
            ..test_config()
        };
        let transport = KafkaTransport::new(config);

        transport.connect().await.unwrap();
        assert_eq!(transport.state().await, ConnectionState::Connected);

        transport.send(&sample_record()).await.unwrap();

        transport.close().await.unwrap();
        assert_eq!(transport.state().await, ConnectionState::Disconnected);
    }
}
