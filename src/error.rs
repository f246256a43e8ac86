//! Error model shared by the session manager, the API client and the query layer.
//! `AuthFailure` is the narrow result of a credentials exchange; `AdminError` is
//! what every resource call and mutation can fail with.

use thiserror::Error;

/// Why a credentials exchange did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// Backend rejected the credentials, or they were missing.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },
    /// Backend unreachable, timed out, or no login URL configured.
    #[error("authentication service unavailable: {message}")]
    ServiceUnavailable { message: String },
    /// Backend reported success without a user object or access token.
    #[error("malformed login response: {message}")]
    MalformedResponse { message: String },
}

impl AuthFailure {
    pub fn invalid<S: Into<String>>(msg: S) -> Self { AuthFailure::InvalidCredentials { message: msg.into() } }
    pub fn unavailable<S: Into<String>>(msg: S) -> Self { AuthFailure::ServiceUnavailable { message: msg.into() } }
    pub fn malformed<S: Into<String>>(msg: S) -> Self { AuthFailure::MalformedResponse { message: msg.into() } }

    pub fn code_str(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials { .. } => "invalid_credentials",
            AuthFailure::ServiceUnavailable { .. } => "service_unavailable",
            AuthFailure::MalformedResponse { .. } => "malformed_response",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthFailure::InvalidCredentials { message }
            | AuthFailure::ServiceUnavailable { message }
            | AuthFailure::MalformedResponse { message } => message.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
    /// Backend answered 401. The session has already been invalidated when this is returned.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, detail: Option<String> },
    /// `message` falls back from the body's `message` to its `error` to the reason phrase.
    /// `detail` is the body's `message` field alone.
    #[error("request failed with HTTP {status}: {message}")]
    Request { status: u16, message: String, detail: Option<String> },
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self { AdminError::ServiceUnavailable { message: msg.into() } }
    pub fn malformed<S: Into<String>>(msg: S) -> Self { AdminError::MalformedResponse { message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self { AdminError::Unauthorized { message: msg.into(), detail: None } }
    pub fn request<S: Into<String>>(status: u16, msg: S) -> Self { AdminError::Request { status, message: msg.into(), detail: None } }

    /// Attach the body's own `message` field. Only meaningful on `Request` and `Unauthorized`.
    pub fn with_detail(mut self, text: Option<String>) -> Self {
        if let AdminError::Request { detail, .. } | AdminError::Unauthorized { detail, .. } = &mut self {
            *detail = text.filter(|t| !t.trim().is_empty());
        }
        self
    }
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, msg: S) -> Self {
        AdminError::Validation { field: field.into(), message: msg.into() }
    }
    pub fn config<S: Into<String>>(msg: S) -> Self { AdminError::Config { message: msg.into() } }

    pub fn code_str(&self) -> &'static str {
        match self {
            AdminError::InvalidCredentials { .. } => "invalid_credentials",
            AdminError::ServiceUnavailable { .. } => "service_unavailable",
            AdminError::MalformedResponse { .. } => "malformed_response",
            AdminError::Unauthorized { .. } => "unauthorized",
            AdminError::Request { .. } => "request_error",
            AdminError::Validation { .. } => "validation",
            AdminError::Config { .. } => "config",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AdminError::InvalidCredentials { message }
            | AdminError::ServiceUnavailable { message }
            | AdminError::MalformedResponse { message }
            | AdminError::Unauthorized { message, .. }
            | AdminError::Request { message, .. }
            | AdminError::Validation { message, .. }
            | AdminError::Config { message } => message.as_str(),
        }
    }

    /// HTTP status this error corresponds to, as seen by the dashboard.
    pub fn http_status(&self) -> u16 {
        match self {
            AdminError::InvalidCredentials { .. } | AdminError::Unauthorized { .. } => 401,
            AdminError::ServiceUnavailable { .. } => 503,
            AdminError::MalformedResponse { .. } => 502,
            AdminError::Request { status, .. } => *status,
            AdminError::Validation { .. } => 400,
            AdminError::Config { .. } => 500,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdminError::Unauthorized { .. })
    }

    /// The `message` field of the backend's error body, if it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            AdminError::Request { detail, .. } | AdminError::Unauthorized { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Map a transport-level failure. Only called for errors raised before a response arrived.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            AdminError::unavailable("request timed out")
        } else if err.is_connect() {
            AdminError::unavailable(format!("backend unreachable: {}", err))
        } else {
            AdminError::unavailable(err.to_string())
        }
    }
}

impl From<AuthFailure> for AdminError {
    fn from(f: AuthFailure) -> Self {
        match f {
            AuthFailure::InvalidCredentials { message } => AdminError::InvalidCredentials { message },
            AuthFailure::ServiceUnavailable { message } => AdminError::ServiceUnavailable { message },
            AuthFailure::MalformedResponse { message } => AdminError::MalformedResponse { message },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
