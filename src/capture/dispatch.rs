//! Fire-and-forget record dispatch.

use std::sync::Arc;
use tracing::{trace, warn};

use crate::exchange::ExchangeRecord;
use crate::transport::ExchangeTransport;

/// Hand one record to every configured transport, in configured order.
///
/// Runs on its own task, off the response path. A failing transport is logged
/// once per failing attempt and never stops the remaining transports.
pub async fn dispatch(record: ExchangeRecord, transports: Arc<Vec<Arc<dyn ExchangeTransport>>>) {
    for transport in transports.iter() {
        match transport.send(&record).await {
            Ok(()) => {
                trace!(
                    transport = transport.name(),
                    method = %record.request.method,
                    path = %record.request.path,
                    "Exchange record delivered"
                );
            }
            Err(e) => {
                warn!(
                    transport = transport.name(),
                    method = %record.request.method,
                    path = %record.request.path,
                    error = %e,
                    "Failed to deliver exchange record"
                );
            }
        }
    }
}
