//! Configuration module for keyhub.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to (default: "http://localhost:8080/api")
    pub api_base_url: String,
    /// Path to the JSON session file used by the CLI (default: "keyhub-session.json")
    pub session_path: String,
    /// Timeout for a single backend request (default: 30s)
    pub request_timeout: Duration,
    /// Timeout for one token refresh attempt (default: 10s)
    pub refresh_timeout: Duration,
    /// Extra refresh attempts after a transport failure or timeout (default: 1)
    pub refresh_retries: u32,
    /// Location the client navigates to when the session is gone (default: "/login")
    pub login_path: String,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            session_path: "keyhub-session.json".to_string(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(10),
            refresh_retries: 1,
            login_path: "/login".to_string(),
            user_agent: format!("keyhub/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `KEYHUB_API_BASE`: backend base URL
    /// - `KEYHUB_SESSION_PATH`: session file path
    /// - `KEYHUB_REQUEST_TIMEOUT_SECS`: request timeout in seconds
    /// - `KEYHUB_REFRESH_TIMEOUT_SECS`: refresh timeout in seconds
    /// - `KEYHUB_REFRESH_RETRIES`: refresh retry budget
    /// - `KEYHUB_LOGIN_PATH`: login entry point
    ///
    /// Values that fail to parse keep their default.
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(base) = env::var("KEYHUB_API_BASE") {
            cfg.api_base_url = base;
        }

        if let Ok(path) = env::var("KEYHUB_SESSION_PATH") {
            cfg.session_path = path;
        }

        if let Some(secs) = parse_var::<u64>("KEYHUB_REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64>("KEYHUB_REFRESH_TIMEOUT_SECS") {
            cfg.refresh_timeout = Duration::from_secs(secs);
        }

        if let Some(retries) = parse_var::<u32>("KEYHUB_REFRESH_RETRIES") {
            cfg.refresh_retries = retries;
        }

        if let Ok(login_path) = env::var("KEYHUB_LOGIN_PATH") {
            cfg.login_path = login_path;
        }

        cfg
    }

    /// Join an endpoint path onto the configured base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.api_base_url, "http://localhost:8080/api");
        assert_eq!(cfg.session_path, "keyhub-session.json");
        assert_eq!(cfg.refresh_timeout, Duration::from_secs(10));
        assert_eq!(cfg.refresh_retries, 1);
        assert_eq!(cfg.login_path, "/login");
    }

    #[test]
    fn test_endpoint_url_joins_slashes() {
        let mut cfg = ClientConfig::default();
        cfg.api_base_url = "http://example.test/api/".to_string();
        assert_eq!(cfg.endpoint_url("/login"), "http://example.test/api/login");
        assert_eq!(cfg.endpoint_url("usage/today/42"), "http://example.test/api/usage/today/42");
    }
}
