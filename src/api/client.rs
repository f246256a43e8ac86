//!
//! Authenticated REST client
//! -------------------------
//! One `ApiClient` per process. Every request goes through the same pipeline:
//!
//! - augmentation: the current session's access token, if any, is attached
//!   as a bearer credential (read once per request);
//! - a single round trip with the configured timeout, no retries;
//! - inspection: a 401 ends whatever session is current before the error is
//!   returned; other non-2xx answers become `AdminError::Request`.

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{join_url, AdminConfig, ExecutionContext};
use crate::error::{AdminError, AdminResult};
use crate::identity::{SessionEnd, SessionStore};

/// The `message` field of a backend error body, when present and non-blank.
pub(crate) fn message_field(body: Option<&Value>) -> Option<String> {
    body?
        .get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Pull a human-readable message out of a backend error body: `message`, then `error`.
pub(crate) fn backend_message(body: Option<&Value>) -> Option<String> {
    message_field(body).or_else(|| {
        body?
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    context: ExecutionContext,
    http: reqwest::Client,
    sessions: SessionStore,
}

impl ApiClient {
    pub fn new(config: &AdminConfig, context: ExecutionContext, sessions: SessionStore) -> AdminResult<Self> {
        let base = config.api_base(context);
        Url::parse(&base).map_err(|e| AdminError::config(format!("invalid API base URL '{}': {}", base, e)))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdminError::config(format!("failed to build HTTP client: {}", e)))?;
        debug!(%base, ?context, timeout_ms = config.timeout().as_millis() as u64, "api client ready");
        Ok(Self { base, context, http, sessions })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Start a request with the bearer token of the moment attached.
    pub(crate) fn request(&self, method: Method, path: &str) -> Outgoing {
        let url = join_url(&self.base, path);
        let token = self.sessions.access_token();
        let mut builder = self.http.request(method.clone(), url);
        if let Some(t) = token.as_deref() {
            builder = builder.bearer_auth(t);
        }
        Outgoing { builder, method, path: path.to_string(), authed: token.is_some() }
    }

    /// Send and inspect. `Ok(None)` means a 2xx with an empty body.
    pub(crate) async fn execute(&self, out: Outgoing) -> AdminResult<Option<Value>> {
        let Outgoing { builder, method, path, authed } = out;
        let resp = builder.send().await.map_err(|e| {
            warn!(%method, %path, error = %e, "request did not complete");
            AdminError::from_transport(&e)
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| AdminError::from_transport(&e))?;
        let body: Option<Value> = if bytes.is_empty() { None } else { serde_json::from_slice(&bytes).ok() };

        let detail = message_field(body.as_ref());

        if status == StatusCode::UNAUTHORIZED {
            let cleared = self.sessions.invalidate(SessionEnd::Unauthorized);
            warn!(%method, %path, authed, cleared, "backend answered 401; session ended");
            let message = backend_message(body.as_ref()).unwrap_or_else(|| "Unauthorized".to_string());
            return Err(AdminError::unauthorized(message).with_detail(detail));
        }
        if !status.is_success() {
            let message = backend_message(body.as_ref())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            warn!(%method, %path, status = status.as_u16(), %message, "request failed");
            return Err(AdminError::request(status.as_u16(), message).with_detail(detail));
        }
        if !bytes.is_empty() && body.is_none() {
            return Err(AdminError::malformed(format!("{} {} returned a non-JSON body", method, path)));
        }
        debug!(%method, %path, status = status.as_u16(), "request ok");
        Ok(body)
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(&self, out: Outgoing) -> AdminResult<T> {
        let path = out.path.clone();
        let body = self.execute(out).await?;
        decode(&path, body.unwrap_or(Value::Null))
    }

    pub(crate) async fn discard(&self, out: Outgoing) -> AdminResult<()> {
        self.execute(out).await.map(|_| ())
    }
}

pub(crate) fn decode<T: DeserializeOwned>(path: &str, v: Value) -> AdminResult<T> {
    serde_json::from_value(v).map_err(|e| AdminError::malformed(format!("unexpected payload from {}: {}", path, e)))
}

/// A request under construction plus what the inspection step needs to know about it.
pub(crate) struct Outgoing {
    builder: RequestBuilder,
    method: Method,
    path: String,
    authed: bool,
}

impl Outgoing {
    pub(crate) fn query<Q: serde::Serialize + ?Sized>(mut self, q: &Q) -> Self {
        self.builder = self.builder.query(q);
        self
    }

    pub(crate) fn json<B: serde::Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.builder = self.builder.json(body);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_message_prefers_message_then_error() {
        let b = json!({"error": "Validation failed", "code": "VALIDATION_002", "message": "Acronym too long"});
        assert_eq!(backend_message(Some(&b)).as_deref(), Some("Acronym too long"));
        let b = json!({"error": "Invalid credentials", "message": ""});
        assert_eq!(backend_message(Some(&b)).as_deref(), Some("Invalid credentials"));
        assert_eq!(backend_message(Some(&json!({"code": "X"}))), None);
        assert_eq!(backend_message(None), None);
    }

    #[test]
    fn message_field_ignores_error_text() {
        assert_eq!(message_field(Some(&json!({"error": "Account disabled"}))), None);
        assert_eq!(message_field(Some(&json!({"error": "Conflict", "message": "duplicate"}))).as_deref(), Some("duplicate"));
        assert_eq!(message_field(Some(&json!({"message": " "}))), None);
        assert_eq!(message_field(None), None);
    }

    #[test]
    fn invalid_base_is_a_config_error() {
        let cfg = AdminConfig::with_api_url("not a url");
        let err = ApiClient::new(&cfg, ExecutionContext::Public, SessionStore::new()).err().unwrap();
        assert_eq!(err.code_str(), "config");
    }

    #[test]
    fn base_follows_context() {
        let cfg = AdminConfig {
            public_api_url: Some("https://maps.example/api/v1".into()),
            internal_api_url: Some("http://backend:8080/api/v1".into()),
            ..Default::default()
        };
        let public = ApiClient::new(&cfg, ExecutionContext::Public, SessionStore::new()).unwrap();
        let internal = ApiClient::new(&cfg, ExecutionContext::Internal, SessionStore::new()).unwrap();
        assert_eq!(public.base_url(), "https://maps.example/api/v1");
        assert_eq!(internal.base_url(), "http://backend:8080/api/v1");
    }

    #[test]
    fn decode_failure_is_malformed() {
        let r: AdminResult<Vec<String>> = decode("/factions", json!({"oops": true}));
        assert_eq!(r.unwrap_err().code_str(), "malformed_response");
    }
}
