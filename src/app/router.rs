//! Demo route wiring.
//!
//! Plain method/path routing over the users store, exposed as a tower service
//! so the capture layer can wrap it.

use bytes::Bytes;
use http::{header, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;
use uuid::Uuid;

use super::store::{NewUser, UserStore};

#[derive(Clone)]
pub struct AppService {
    store: Arc<UserStore>,
}

impl AppService {
    pub fn new() -> Self {
        Self::with_store(Arc::new(UserStore::new()))
    }

    pub fn with_store(store: Arc<UserStore>) -> Self {
        Self { store }
    }
}

impl Default for AppService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Full<Bytes>>> for AppService {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        let store = self.store.clone();
        Box::pin(async move { Ok(route(store, req).await) })
    }
}

async fn route(store: Arc<UserStore>, req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    let path = parts.uri.path();

    match (&parts.method, path) {
        (&Method::GET, "/") => json(StatusCode::OK, &serde_json::json!({ "hello": "world" })),
        (&Method::GET, "/users") => json(StatusCode::OK, &store.list()),
        (&Method::POST, "/users") => match serde_json::from_slice::<NewUser>(&body) {
            Ok(new_user) => json(StatusCode::CREATED, &store.create(new_user)),
            Err(e) => error_json(StatusCode::BAD_REQUEST, &format!("invalid user payload: {e}")),
        },
        _ => match path.strip_prefix("/users/") {
            Some(id) => match Uuid::parse_str(id) {
                Ok(id) => user_route(&store, &parts.method, id, &body),
                Err(_) => error_json(StatusCode::NOT_FOUND, "no such user"),
            },
            None => error_json(StatusCode::NOT_FOUND, "no such route"),
        },
    }
}

fn user_route(
    store: &UserStore,
    method: &Method,
    id: Uuid,
    body: &Bytes,
) -> Response<Full<Bytes>> {
    match method {
        &Method::GET => match store.get(id) {
            Some(user) => json(StatusCode::OK, &user),
            None => error_json(StatusCode::NOT_FOUND, "no such user"),
        },
        &Method::PUT => match serde_json::from_slice::<NewUser>(body) {
            Ok(new_user) => match store.update(id, new_user) {
                Some(user) => json(StatusCode::OK, &user),
                None => error_json(StatusCode::NOT_FOUND, "no such user"),
            },
            Err(e) => error_json(StatusCode::BAD_REQUEST, &format!("invalid user payload: {e}")),
        },
        &Method::DELETE => {
            if store.delete(id) {
                empty(StatusCode::NO_CONTENT)
            } else {
                error_json(StatusCode::NOT_FOUND, "no such user")
            }
        }
        _ => error_json(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
    }
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap(),
        Err(e) => error_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("serialization failed: {e}"),
        ),
    }
}

fn error_json(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap()
}
