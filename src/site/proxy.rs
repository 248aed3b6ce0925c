//! Upstream proxy descriptor

use serde::{Deserialize, Serialize};

/// Proxy settings shared by the browser session and the API path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    /// `host:port` endpoint
    pub server: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Scheme used by the HTTP client (`http` or `https`)
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "http".to_string()
}

impl ProxyConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            username: None,
            password: None,
            protocol: default_protocol(),
        }
    }

    /// Build from optional parts; no server means no proxy.
    /// Empty strings count as absent.
    pub fn from_parts(
        server: Option<String>,
        username: Option<String>,
        password: Option<String>,
        protocol: Option<String>,
    ) -> Option<Self> {
        let server = non_empty(server)?;
        Some(Self {
            server,
            username: non_empty(username),
            password: non_empty(password),
            protocol: non_empty(protocol).unwrap_or_else(default_protocol),
        })
    }

    /// Host and port, split on `:`
    pub fn host_port(&self) -> (&str, Option<&str>) {
        let mut parts = self.server.split(':');
        let host = parts.next().unwrap_or_default();
        (host, parts.next())
    }

    /// Username and password, only when both are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }

    /// Proxy URL for the HTTP client
    pub fn url(&self) -> String {
        match self.host_port() {
            (host, Some(port)) => format!("{}://{}:{}", self.protocol, host, port),
            (host, None) => format!("{}://{}", self.protocol, host),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
