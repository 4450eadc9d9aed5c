use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use inventory_client::{ApiClient, ApiSettings};
use serde_json::{json, Value};

/// A request the stub backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Clone)]
enum Canned {
    Json(StatusCode, Value),
    Text(StatusCode, String),
}

#[derive(Default)]
struct Stub {
    routes: Mutex<HashMap<(Method, String), Canned>>,
    received: Mutex<Vec<Recorded>>,
}

async fn handle(
    State(stub): State<Arc<Stub>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    stub.received.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        headers,
        body: serde_json::from_slice(&body).ok(),
    });

    let canned = stub.routes.lock().unwrap().get(&(method, path)).cloned();
    match canned {
        Some(Canned::Json(status, value)) => (status, Json(value)).into_response(),
        Some(Canned::Text(status, text)) => (status, text).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response(),
    }
}

/// In-process stand-in for the inventory backend. Unknown routes answer 404.
pub struct TestApp {
    pub address: String,
    stub: Arc<Stub>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let stub = Arc::new(Stub::default());
        let app = Router::new().fallback(handle).with_state(stub.clone());

        // Random port for testing
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            stub,
        }
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.stub
            .routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Canned::Json(status, body));
    }

    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.stub
            .routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Canned::Text(status, body.to_string()));
    }

    pub fn received(&self) -> Vec<Recorded> {
        self.stub.received.lock().unwrap().clone()
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.received().iter().map(Recorded::line).collect()
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(ApiSettings::with_base_url(&self.address))
    }
}

/// Address nothing is listening on.
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
