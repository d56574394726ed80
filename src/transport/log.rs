//! Debug log transport.
//!
//! Emits one debug line per recorded exchange. Useful alongside the Kafka
//! producer when tracing what the pipeline is dispatching.

use async_trait::async_trait;

use super::ExchangeTransport;
use crate::error::Result;
use crate::exchange::ExchangeRecord;

#[derive(Debug, Default)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExchangeTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, record: &ExchangeRecord) -> Result<()> {
        tracing::debug!(
            method = %record.request.method,
            path = %record.request.path,
            status = record.response.status_code,
            "Recorded exchange"
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
