//! In-process diploma backend for integration tests.
//!
//! Serves canned replies under `/api` and records every request it sees.

#![allow(dead_code)]

use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

pub const ADMIN: &str = "0x1234567890123456789012345678901234567890";
pub const ISSUER: &str = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd";
pub const VERIFIER: &str = "0x9876543210987654321098765432109876543210";

/// Hash the backend reports as a valid diploma.
pub const VALID_HASH: &str = "0xvalid";
/// Hash for which the verification endpoint fails with a JSON body.
pub const FAILING_HASH: &str = "boom";
/// Hash for which the verification endpoint fails with a plain text body.
pub const TEXT_FAILING_HASH: &str = "gateway";

/// One request as seen by the backend.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    /// Raw, still percent-encoded path.
    pub path: String,
    pub wallet: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct Backend {
    seen: Mutex<Vec<Seen>>,
}

impl Backend {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    /// Number of requests whose path starts with `prefix` (after `/api`).
    pub fn hits(&self, prefix: &str) -> usize {
        let prefix = format!("/api{}", prefix);
        self.seen
            .lock()
            .iter()
            .filter(|s| s.path.starts_with(&prefix))
            .count()
    }

    pub fn last(&self) -> Option<Seen> {
        self.seen.lock().last().cloned()
    }

    fn attach_body(&self, body: Value) {
        if let Some(last) = self.seen.lock().last_mut() {
            last.body = Some(body);
        }
    }
}

pub struct MockServer {
    pub backend: Arc<Backend>,
    pub addr: SocketAddr,
}

impl MockServer {
    /// Base URL of the API, e.g. `http://127.0.0.1:41234/api`.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

/// Bind to an ephemeral port and serve the backend in the background.
pub async fn spawn_backend() -> MockServer {
    let backend = Arc::new(Backend::default());

    let api = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/verify", get(verify_token))
        .route("/admin/users/:id/status", patch(update_user_status))
        .route("/issuer/diplomas", post(create_diploma))
        .route("/verifier/verify/:hash", get(verify_diploma))
        .route("/verifier/history", get(history))
        .route("/blockchain/proof/:hash", get(proof))
        .route("/blockchain/transaction/:tx_hash", get(transaction));

    let app = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });

    MockServer { backend, addr }
}

/// Address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    listener.local_addr().expect("local addr")
}

async fn record(State(backend): State<Arc<Backend>>, request: Request, next: Next) -> Response {
    let seen = {
        let read = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Seen {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            wallet: read("x-wallet-address"),
            content_type: read(header::CONTENT_TYPE.as_str()),
            body: None,
        }
    };
    backend.seen.lock().push(seen);
    next.run(request).await
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn verify_token(headers: HeaderMap) -> Json<Value> {
    Json(json!({ "valid": headers.contains_key("x-wallet-address") }))
}

async fn update_user_status(
    State(backend): State<Arc<Backend>>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> &'static str {
    backend.attach_body(body);
    "updated"
}

async fn create_diploma(
    State(backend): State<Arc<Backend>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.attach_body(body);
    Json(json!({ "id": "d-1", "hash": "0xnew", "status": "pending" }))
}

async fn verify_diploma(Path(hash): Path<String>) -> Response {
    match hash.as_str() {
        VALID_HASH => Json(json!({
            "valid": true,
            "diploma": {
                "studentName": "Alice Martin",
                "degree": "Master",
                "field": "Physics",
                "graduationDate": "2023-06-30",
                "issuerName": "University of Lyon"
            }
        }))
        .into_response(),
        FAILING_HASH => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        )
            .into_response(),
        TEXT_FAILING_HASH => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
        _ => Json(json!({ "valid": false, "diploma": {} })).into_response(),
    }
}

async fn history() -> Json<Value> {
    Json(json!([
        {
            "id": "v1",
            "studentName": "Alice Martin",
            "degree": "Master",
            "diplomaHash": "0xaaa",
            "status": "valid",
            "verifiedAt": "2023-01-03T09:30:00Z"
        },
        {
            "id": "v2",
            "studentName": "Bob Stone",
            "hash": "0xbbb",
            "status": "invalid",
            "verificationDate": "2023-01-05"
        },
        {
            "id": "v3",
            "studentName": "Carla Diaz",
            "hash": "0xccc",
            "status": "valid",
            "verificationDate": "2023-02-01"
        }
    ]))
}

async fn proof(Path(hash): Path<String>) -> Json<Value> {
    Json(json!({ "proof": format!("proof-of-{}", hash), "transactionHash": "0xtx" }))
}

async fn transaction(Path(tx_hash): Path<String>) -> Json<Value> {
    Json(json!({
        "status": if tx_hash == "0xtx" { "confirmed" } else { "pending" },
        "blockNumber": 42
    }))
}
