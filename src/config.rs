//! Process configuration read from the environment.
//!
//! All values are optional; blank values count as unset. The two API base
//! URLs feed different consumers: the login flow only trusts explicitly
//! configured URLs, while the resource client falls back to well-known
//! development defaults.

use std::fmt;
use std::time::Duration;

pub const ENV_PUBLIC_API_URL: &str = "ADMIN_PUBLIC_API_URL";
pub const ENV_INTERNAL_API_URL: &str = "ADMIN_INTERNAL_API_URL";
pub const ENV_SESSION_SECRET: &str = "ADMIN_SESSION_SECRET";
pub const ENV_SESSION_URL: &str = "ADMIN_SESSION_URL";
pub const ENV_MAPBOX_TOKEN: &str = "ADMIN_MAPBOX_TOKEN";
pub const ENV_API_TIMEOUT_MS: &str = "ADMIN_API_TIMEOUT_MS";
pub const ENV_QUERY_STALE_SECS: &str = "ADMIN_QUERY_STALE_SECS";

pub const DEFAULT_PUBLIC_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_INTERNAL_API_URL: &str = "http://backend:8080/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

/// Where a request is issued from. Decides which base URL the client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionContext {
    /// Calls that reach the backend through its public address.
    #[default]
    Public,
    /// Calls issued next to the backend (same network), via the internal address.
    Internal,
}

impl ExecutionContext {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" | "browser" => Some(Self::Public),
            "internal" | "server" => Some(Self::Internal),
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct AdminConfig {
    pub public_api_url: Option<String>,
    pub internal_api_url: Option<String>,
    pub session_secret: Option<String>,
    pub session_url: Option<String>,
    pub map_token: Option<String>,
    pub request_timeout: Option<Duration>,
    pub stale_time: Option<Duration>,
}

impl AdminConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Used by tests to avoid mutating the process env.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let request_timeout = get(ENV_API_TIMEOUT_MS)
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        let stale_time = get(ENV_QUERY_STALE_SECS)
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        Self {
            public_api_url: get(ENV_PUBLIC_API_URL),
            internal_api_url: get(ENV_INTERNAL_API_URL),
            session_secret: get(ENV_SESSION_SECRET),
            session_url: get(ENV_SESSION_URL),
            map_token: get(ENV_MAPBOX_TOKEN),
            request_timeout,
            stale_time,
        }
    }

    /// Convenience for pointing both addresses at one backend.
    pub fn with_api_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            public_api_url: Some(url.clone()),
            internal_api_url: Some(url),
            ..Default::default()
        }
    }

    /// Base URL for resource calls issued from `ctx`, with defaults applied.
    pub fn api_base(&self, ctx: ExecutionContext) -> String {
        match ctx {
            ExecutionContext::Public => self
                .public_api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_PUBLIC_API_URL.to_string()),
            ExecutionContext::Internal => self
                .internal_api_url
                .clone()
                .or_else(|| self.public_api_url.clone())
                .unwrap_or_else(|| DEFAULT_INTERNAL_API_URL.to_string()),
        }
    }

    /// Base URL for the credentials exchange. No defaults: `None` means unconfigured.
    pub fn login_base(&self) -> Option<&str> {
        self.internal_api_url
            .as_deref()
            .or(self.public_api_url.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        self.request_timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn query_stale_time(&self) -> Duration {
        self.stale_time.unwrap_or(DEFAULT_STALE_TIME)
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AdminConfig")
            .field("public_api_url", &self.public_api_url)
            .field("internal_api_url", &self.internal_api_url)
            .field("session_secret", &redact(&self.session_secret))
            .field("session_url", &self.session_url)
            .field("map_token", &redact(&self.map_token))
            .field("request_timeout", &self.timeout())
            .field("stale_time", &self.query_stale_time())
            .finish()
    }
}

/// Join a base URL and an endpoint path with exactly one slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> AdminConfig {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AdminConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_configured() {
        let c = cfg(&[]);
        assert_eq!(c.api_base(ExecutionContext::Public), DEFAULT_PUBLIC_API_URL);
        assert_eq!(c.api_base(ExecutionContext::Internal), DEFAULT_INTERNAL_API_URL);
        assert!(c.login_base().is_none());
        assert_eq!(c.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn internal_falls_back_to_public() {
        let c = cfg(&[(ENV_PUBLIC_API_URL, "https://maps.example/api/v1")]);
        assert_eq!(c.api_base(ExecutionContext::Internal), "https://maps.example/api/v1");
        assert_eq!(c.login_base(), Some("https://maps.example/api/v1"));
    }

    #[test]
    fn login_prefers_internal() {
        let c = cfg(&[
            (ENV_PUBLIC_API_URL, "https://maps.example/api/v1"),
            (ENV_INTERNAL_API_URL, "http://backend:8080/api/v1"),
        ]);
        assert_eq!(c.login_base(), Some("http://backend:8080/api/v1"));
        assert_eq!(c.api_base(ExecutionContext::Public), "https://maps.example/api/v1");
    }

    #[test]
    fn blank_values_are_unset() {
        let c = cfg(&[(ENV_INTERNAL_API_URL, "   "), (ENV_API_TIMEOUT_MS, "")]);
        assert!(c.internal_api_url.is_none());
        assert_eq!(c.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn timeout_and_stale_time_parse() {
        let c = cfg(&[(ENV_API_TIMEOUT_MS, "2500"), (ENV_QUERY_STALE_SECS, "0")]);
        assert_eq!(c.timeout(), Duration::from_millis(2500));
        assert_eq!(c.query_stale_time(), Duration::ZERO);
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = cfg(&[(ENV_SESSION_SECRET, "s3cr3t"), (ENV_MAPBOX_TOKEN, "pk.abc")]);
        let s = format!("{:?}", c);
        assert!(!s.contains("s3cr3t"));
        assert!(!s.contains("pk.abc"));
        assert!(s.contains("<redacted>"));
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/api/v1/", "/auth/login"), "http://h/api/v1/auth/login");
        assert_eq!(join_url("http://h/api/v1", "factions"), "http://h/api/v1/factions");
    }

    #[test]
    fn execution_context_parse() {
        assert_eq!(ExecutionContext::parse("Server"), Some(ExecutionContext::Internal));
        assert_eq!(ExecutionContext::parse("public"), Some(ExecutionContext::Public));
        assert_eq!(ExecutionContext::parse("edge"), None);
    }
}
