use std::fmt;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::client::message_field;
use crate::config::{join_url, AdminConfig};
use crate::error::{AdminError, AuthFailure};

use super::principal::UserProfile;
use super::session::Session;
use super::token::jwt_expiry;

/// Credentials as sent to `POST /auth/login`. Never persisted.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl LoginResponse {
    /// Check a 2xx login body carries what a session needs, then decode it.
    pub fn from_body(body: Option<&Value>) -> Result<Self, AuthFailure> {
        let Some(body) = body else {
            return Err(AuthFailure::malformed("login response has no JSON body"));
        };
        let has_user = body.get("user").map(Value::is_object).unwrap_or(false);
        let has_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .map(|t| !t.is_empty())
            .unwrap_or(false);
        if !has_user || !has_token {
            return Err(AuthFailure::malformed("login response missing required fields"));
        }
        serde_json::from_value(body.clone())
            .map_err(|e| AuthFailure::malformed(format!("unexpected login response shape: {}", e)))
    }

    /// Build the session. Expiry comes from `expires_in`, else from the token's `exp` claim.
    pub fn into_session(self, now: DateTime<Utc>) -> Result<Session, AuthFailure> {
        let expires_at = match self.expires_in.filter(|secs| *secs > 0) {
            Some(secs) => Some(
                ChronoDuration::try_seconds(secs)
                    .and_then(|d| now.checked_add_signed(d))
                    .ok_or_else(|| AuthFailure::malformed(format!("expires_in out of range: {}", secs)))?,
            ),
            None => jwt_expiry(&self.access_token),
        };
        Ok(Session {
            user_id: self.user.id,
            email: self.user.email,
            name: self.user.name,
            role: self.user.role,
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            issued_at: now,
            expires_at,
        })
    }
}

/// Exchanges credentials with the backend login endpoint.
#[derive(Clone)]
pub struct CredentialsProvider {
    login_url: Option<String>,
    http: reqwest::Client,
}

impl CredentialsProvider {
    pub fn new(config: &AdminConfig) -> Result<Self, AdminError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdminError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            login_url: config.login_base().map(|base| join_url(base, "/auth/login")),
            http,
        })
    }

    pub fn login_url(&self) -> Option<&str> {
        self.login_url.as_deref()
    }

    pub async fn exchange(&self, req: &LoginRequest) -> Result<Session, AuthFailure> {
        if !req.is_complete() {
            warn!("login refused: missing credentials");
            return Err(AuthFailure::invalid("missing credentials"));
        }
        let Some(url) = self.login_url.as_deref() else {
            error!("login refused: no API URL configured");
            return Err(AuthFailure::unavailable("API URL not configured"));
        };

        let resp = self.http.post(url).json(req).send().await.map_err(|e| {
            error!(email = %req.email, error = %e, "error contacting auth service");
            AuthFailure::unavailable("Authentication service unavailable")
        })?;
        let status = resp.status();
        let body: Option<Value> = resp.json().await.ok();

        if !status.is_success() {
            let message = message_field(body.as_ref()).unwrap_or_else(|| "Invalid credentials".to_string());
            warn!(email = %req.email, status = status.as_u16(), %message, "login failed");
            return Err(AuthFailure::InvalidCredentials { message });
        }

        let session = LoginResponse::from_body(body.as_ref())
            .and_then(|parsed| parsed.into_session(Utc::now()))
            .inspect_err(|e| {
                error!(email = %req.email, error = %e, "login response rejected");
            })?;
        info!(email = %session.email, role = %session.role, "login succeeded");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incomplete_credentials() {
        assert!(!LoginRequest::new("", "x").is_complete());
        assert!(!LoginRequest::new("  ", "x").is_complete());
        assert!(!LoginRequest::new("a@b.com", "").is_complete());
        assert!(LoginRequest::new("a@b.com", "x").is_complete());
    }

    #[test]
    fn password_not_in_debug() {
        let s = format!("{:?}", LoginRequest::new("a@b.com", "hunter22"));
        assert!(s.contains("a@b.com"));
        assert!(!s.contains("hunter22"));
    }

    #[test]
    fn body_without_token_is_malformed() {
        let body = json!({"user": {"id": "1", "email": "a@b.com", "name": "A", "role": "admin"}, "refresh_token": "R1"});
        let err = LoginResponse::from_body(Some(&body)).unwrap_err();
        assert_eq!(err.code_str(), "malformed_response");
    }

    #[test]
    fn body_without_user_is_malformed() {
        let body = json!({"access_token": "T1"});
        assert!(matches!(LoginResponse::from_body(Some(&body)), Err(AuthFailure::MalformedResponse { .. })));
        assert!(matches!(LoginResponse::from_body(None), Err(AuthFailure::MalformedResponse { .. })));
    }

    #[test]
    fn session_takes_expiry_from_expires_in() {
        let body = json!({
            "user": {"id": "1", "email": "a@b.com", "name": "A", "role": "admin"},
            "access_token": "T1", "refresh_token": "R1", "expires_in": 86400
        });
        let now = Utc::now();
        let s = LoginResponse::from_body(Some(&body)).unwrap().into_session(now).unwrap();
        assert_eq!(s.expires_at, Some(now + ChronoDuration::seconds(86400)));
        assert_eq!(s.refresh_token.as_deref(), Some("R1"));
    }

    #[test]
    fn huge_expires_in_is_malformed() {
        for secs in [i64::MAX, 9_000_000_000_000] {
            let body = json!({
                "user": {"id": "1", "email": "a@b.com", "name": "A", "role": "admin"},
                "access_token": "T1", "expires_in": secs
            });
            let err = LoginResponse::from_body(Some(&body)).unwrap().into_session(Utc::now()).unwrap_err();
            assert_eq!(err.code_str(), "malformed_response", "{secs}");
        }
    }

    #[test]
    fn missing_login_url_without_network() {
        let p = CredentialsProvider::new(&AdminConfig::default()).unwrap();
        assert!(p.login_url().is_none());
    }
}
