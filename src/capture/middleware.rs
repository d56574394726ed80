//! Capture middleware.
//!
//! [`CaptureService`] wraps the application's service so that every request
//! produces exactly one [`crate::exchange::ExchangeRecord`]. The inbound body
//! is buffered once and handed to the inner handler byte-for-byte; the record
//! is completed only after the full response is materialized, then dispatched
//! to the configured transports on an independent task. Nothing on the capture
//! path can delay or fail the client's response.

use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

use super::dispatch::dispatch;
use crate::error::CaptureError;
use crate::exchange::PendingExchange;
use crate::transport::ExchangeTransport;

/// Layer wiring an ordered transport list into the request pipeline.
///
/// The transport list is the middleware's only configuration; it holds no
/// other cross-request state.
#[derive(Clone)]
pub struct CaptureLayer {
    transports: Arc<Vec<Arc<dyn ExchangeTransport>>>,
}

impl CaptureLayer {
    pub fn new(transports: Vec<Arc<dyn ExchangeTransport>>) -> Self {
        Self {
            transports: Arc::new(transports),
        }
    }
}

impl<S> Layer<S> for CaptureLayer {
    type Service = CaptureService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CaptureService {
            inner,
            transports: self.transports.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CaptureService<S> {
    inner: S,
    transports: Arc<Vec<Arc<dyn ExchangeTransport>>>,
}

impl<S, B> Service<Request<B>> for CaptureService<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<Full<Bytes>>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let transports = self.transports.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();

            // Buffer the inbound body once; the handler reads the identical
            // bytes, the pending exchange keeps a cheap second reference.
            let body_bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let err = CaptureError::BodyRead(e.to_string());
                    warn!(error = %err, "Request capture failed");
                    return Ok(bad_request());
                }
            };

            let pending = PendingExchange::begin(&parts, body_bytes.clone());
            let req = Request::from_parts(parts, Full::new(body_bytes));

            let response = match inner.call(req).await {
                Ok(response) => response,
                Err(infallible) => match infallible {},
            };

            let (parts, body) = response.into_parts();
            let body_bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(infallible) => match infallible {},
            };

            // The full response is known here, so the record is final.
            let record = pending.complete(&parts, body_bytes.clone());

            // Fire and forget: the dispatch task runs concurrently with
            // response delivery and is never awaited on this path.
            if !transports.is_empty() {
                tokio::spawn(dispatch(record, transports));
            }

            Ok(Response::from_parts(parts, Full::new(body_bytes)))
        })
    }
}

fn bad_request() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from_static(
            b"{\"error\":\"invalid request body\"}",
        )))
        .unwrap()
}
