//! HTTP serving.
//!
//! Accepts connections and drives the capture-wrapped application service
//! with hyper. Shutdown is signaled over a broadcast channel so the accept
//! loop stops before transports are drained and closed.

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

pub struct HttpServer<S> {
    listener: TcpListener,
    service: S,
}

impl<S> HttpServer<S>
where
    S: tower::Service<Request<Incoming>, Response = Response<Full<Bytes>>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    pub async fn bind(config: &ServerConfig, service: S) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{addr}: {e}")))?;

        Ok(Self { listener, service })
    }

    /// The bound address; useful when the configured port is ephemeral.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(addr = %self.local_addr()?, "Listening for HTTP connections");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("HTTP server shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            let err = ServerError::Accept(e.to_string());
                            error!(error = %err, "Failed to accept connection");
                            continue;
                        }
                    };

                    let service = TowerToHyperService::new(self.service.clone());
                    tokio::spawn(async move {
                        if let Err(e) = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await
                        {
                            debug!(peer = %peer, error = %e, "Connection closed with error");
                        }
                    });
                }
            }
        }

        Ok(())
    }
}
