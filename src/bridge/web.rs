//! Web/HTTP Bridge - Coupon endpoint requests via reqwest
//!
//! One JSON `POST` per call, optionally routed through an upstream proxy.
//! Non-2xx statuses are errors, like any other transport failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::BridgeError;
use crate::site::ProxyConfig;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResponse {
    pub status: u16,
    pub body: Value,
}

impl WebResponse {
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug)]
pub struct WebBridge {
    client: reqwest::Client,
}

impl WebBridge {
    pub fn new(proxy: Option<&ProxyConfig>, timeout: Duration) -> Result<Self, BridgeError> {
        let mut client_builder = reqwest::Client::builder().timeout(timeout);

        // Only the configured proxy is used, never the environment's
        match proxy {
            Some(proxy) => {
                let mut upstream = reqwest::Proxy::all(proxy.url())
                    .map_err(|e| BridgeError::ConfigError(format!("Invalid proxy: {}", e)))?;
                if let Some((username, password)) = proxy.credentials() {
                    upstream = upstream.basic_auth(username, password);
                }
                client_builder = client_builder.proxy(upstream);
            }
            None => client_builder = client_builder.no_proxy(),
        }

        let client = client_builder
            .build()
            .map_err(|e| BridgeError::StartupFailed(e.to_string()))?;

        Ok(Self { client })
    }

    /// POST `body` as JSON and parse the response body.
    ///
    /// Bodies that are not JSON come back as a JSON string.
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<WebResponse, BridgeError> {
        let start = std::time::Instant::now();
        debug!("Executing POST {}", url);

        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            warn!("Request failed: {}", e);
            if e.is_timeout() {
                BridgeError::Timeout
            } else {
                BridgeError::ServerError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let body_text = response
            .text()
            .await
            .map_err(|e| BridgeError::ServerError(e.to_string()))?;

        info!("POST {} -> {} ({}ms)", url, status, elapsed_ms);

        let web_response = WebResponse {
            status,
            body: parse_body(body_text),
        };

        if !web_response.is_success() {
            return Err(BridgeError::HttpError {
                status,
                message: format!("Request failed with status code {}", status),
            });
        }

        Ok(web_response)
    }
}

fn parse_body(text: String) -> Value {
    if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_web_response_status_checks() {
        let response = WebResponse {
            status: 200,
            body: Value::Null,
        };
        assert!(response.is_success());

        for status in [199, 302, 404, 500] {
            assert!(!WebResponse { status, ..response.clone() }.is_success());
        }
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), Value::Null);
        assert_eq!(parse_body(r#"{"a":1}"#.into()), json!({ "a": 1 }));
        assert_eq!(parse_body("plain".into()), json!("plain"));
    }

    #[test]
    fn test_new_with_proxy() {
        let proxy = ProxyConfig::from_parts(
            Some("127.0.0.1:3128".into()),
            Some("u".into()),
            Some("p".into()),
            None,
        );
        assert!(WebBridge::new(proxy.as_ref(), DEFAULT_TIMEOUT).is_ok());
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/coupon")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(json!({ "code": "SAVE10" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"valid SAVE10"}"#)
            .create_async()
            .await;

        let bridge = WebBridge::new(None, DEFAULT_TIMEOUT).unwrap();
        let response = bridge
            .post_json(&format!("{}/coupon", server.url()), &json!({ "code": "SAVE10" }))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["status"], "valid SAVE10");
    }

    #[tokio::test]
    async fn test_post_json_non_success_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/coupon")
            .with_status(422)
            .with_body("nope")
            .create_async()
            .await;

        let bridge = WebBridge::new(None, DEFAULT_TIMEOUT).unwrap();
        let err = bridge
            .post_json(&format!("{}/coupon", server.url()), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::HttpError { status: 422, .. }));
    }
}
