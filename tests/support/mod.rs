//! Shared helpers for integration tests: mock transports and a server
//! harness bound to an ephemeral port.

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tower::Layer;

use http_exchange_recorder::app::AppService;
use http_exchange_recorder::capture::CaptureLayer;
use http_exchange_recorder::config::ServerConfig;
use http_exchange_recorder::error::{Result, TransportError};
use http_exchange_recorder::exchange::ExchangeRecord;
use http_exchange_recorder::server::HttpServer;
use http_exchange_recorder::transport::ExchangeTransport;

/// Collects every record it is handed, in arrival order.
#[derive(Default)]
pub struct RecordingTransport {
    records: Mutex<Vec<ExchangeRecord>>,
}

impl RecordingTransport {
    pub fn records(&self) -> Vec<ExchangeRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, record: &ExchangeRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Rejects every record, counting the attempts.
#[derive(Default)]
pub struct FailingTransport {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl ExchangeTransport for FailingTransport {
    fn name(&self) -> &str {
        "failing"
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, _record: &ExchangeRecord) -> Result<()> {
        self.attempts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(TransportError::SendFailed("always fails".into()).into())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Delivers successfully but only after a delay, to expose any accidental
/// awaiting of transports on the response path.
pub struct SlowTransport {
    pub delay: Duration,
}

#[async_trait]
impl ExchangeTransport for SlowTransport {
    fn name(&self) -> &str {
        "slow"
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, _record: &ExchangeRecord) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Start the demo app behind the capture layer on an ephemeral port.
pub async fn start_recorder(
    transports: Vec<Arc<dyn ExchangeTransport>>,
) -> (SocketAddr, broadcast::Sender<()>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let service = CaptureLayer::new(transports).layer(AppService::new());
    let server = HttpServer::bind(&config, service)
        .await
        .expect("failed to bind test server");
    let addr = server.local_addr().expect("no local addr");

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(server.run(shutdown_rx));

    (addr, shutdown_tx)
}

/// Poll the recording transport until `count` records arrived.
pub async fn wait_for_records(transport: &RecordingTransport, count: usize) -> Vec<ExchangeRecord> {
    for _ in 0..200 {
        let records = transport.records();
        if records.len() >= count {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {count} records");
}
