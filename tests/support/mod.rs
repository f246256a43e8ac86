#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use faction_admin::{AdminConfig, ApiClient, ExecutionContext, SessionManager};

pub const API_PREFIX: &str = "/api/v1";

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: Option<Value>,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<HashMap<String, Canned>>>,
    hits: Arc<Mutex<Vec<Hit>>>,
}

async fn handle(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let hit = Hit {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    };
    let key = format!("{} {}", hit.method, hit.path);
    st.hits.lock().push(hit);
    let canned = st.routes.lock().get(&key).cloned();
    if let Some(d) = canned.as_ref().and_then(|c| c.delay) {
        tokio::time::sleep(d).await;
    }
    match canned {
        Some(Canned { status, body: Some(b), .. }) => (status, Json(b)).into_response(),
        Some(Canned { status, body: None, .. }) => status.into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Not Found", "code": "NOT_FOUND", "message": format!("no route for {}", key)})),
        )
            .into_response(),
    }
}

// Aborts the server task when the backend goes out of scope.
struct Guard(JoinHandle<()>);
impl Drop for Guard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Scriptable stand-in for the dashboard backend, bound to an ephemeral localhost port.
pub struct MockBackend {
    pub base: String,
    state: MockState,
    _guard: Guard,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock backend error: {e:?}");
            }
        });
        Self { base: format!("http://{}{}", addr, API_PREFIX), state, _guard: Guard(handle) }
    }

    /// Answer `method path` (path relative to the API prefix) with `status` and a JSON body.
    pub fn on(&self, method: &str, path: &str, status: u16, body: Value) {
        self.set(method, path, status, Some(body), None);
    }

    /// Like `on`, but hold the response back for `delay`.
    pub fn on_after(&self, delay: Duration, method: &str, path: &str, status: u16, body: Value) {
        self.set(method, path, status, Some(body), Some(delay));
    }

    /// Answer with `status` and an empty body.
    pub fn on_empty(&self, method: &str, path: &str, status: u16) {
        self.set(method, path, status, None, None);
    }

    fn set(&self, method: &str, path: &str, status: u16, body: Option<Value>, delay: Option<Duration>) {
        let status = StatusCode::from_u16(status).expect("valid status");
        self.state.routes.lock().insert(format!("{} {}{}", method, API_PREFIX, path), Canned { status, body, delay });
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().clone()
    }

    pub fn hits_to(&self, method: &str, path: &str) -> Vec<Hit> {
        let full = format!("{}{}", API_PREFIX, path);
        self.hits().into_iter().filter(|h| h.method == method && h.path == full).collect()
    }

    pub fn config(&self) -> AdminConfig {
        AdminConfig::with_api_url(self.base.clone())
    }

    /// Session manager and API client sharing one session store, both pointed at this backend.
    pub fn wire(&self) -> (SessionManager, ApiClient) {
        let cfg = self.config();
        let sessions = SessionManager::new(&cfg).expect("session manager");
        let api = ApiClient::new(&cfg, ExecutionContext::Public, sessions.store().clone()).expect("api client");
        (sessions, api)
    }

    /// Script the canonical successful login: a@b.com / x -> T1 / R1, role admin.
    pub fn accept_login(&self) {
        self.on("POST", "/auth/login", 200, login_body("T1", "R1"));
    }
}

pub fn login_body(access: &str, refresh: &str) -> Value {
    json!({
        "user": {"id": "1", "email": "a@b.com", "name": "A", "role": "admin"},
        "access_token": access,
        "refresh_token": refresh
    })
}

pub fn faction_json(id: &str, name: &str, acronym: &str) -> Value {
    json!({
        "id": id, "name": name, "acronym": acronym, "color_hex": "#ff0000",
        "display_priority": 1, "active": true, "description": null
    })
}
