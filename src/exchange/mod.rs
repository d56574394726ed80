pub mod builder;
pub mod record;

pub use builder::PendingExchange;
pub use record::{ExchangeRecord, Headers, RecordedRequest, RecordedResponse};
