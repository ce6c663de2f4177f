//! Uniform result shape for DQ API calls
//!
//! [`call`] never fails: transport, HTTP and decoding problems all end up as a
//! [`CallResult::Failure`] so tools can pass them straight to the caller.

use crate::client::{DqClient, RequestOptions};
use crate::DqError;
use reqwest::Method;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use tracing::{debug, error};

/// Characters of an error response body kept in the failure message
pub const ERROR_BODY_LIMIT: usize = 500;

/// Category of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Http,
    Connection,
    Timeout,
    Transport,
    JsonDecode,
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Http => "http-error",
            FailureKind::Connection => "connection-error",
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport-error",
            FailureKind::JsonDecode => "json-decode-error",
            FailureKind::Unexpected => "unexpected-error",
        };
        f.write_str(name)
    }
}

/// Outcome of a DQ API call
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    Success { data: Value },
    Failure { kind: FailureKind, message: String },
}

impl CallResult {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        CallResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            CallResult::Success { data } => Some(data),
            CallResult::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CallResult::Success { .. } => None,
            CallResult::Failure { message, .. } => Some(message),
        }
    }

    /// `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"Failed to encode result: {e}"}}"#)
        })
    }
}

impl Serialize for CallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            CallResult::Success { data } => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
            }
            CallResult::Failure { message, .. } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", message)?;
            }
        }
        map.end()
    }
}

/// Perform a DQ request and classify the outcome
pub async fn call(
    client: &DqClient,
    method: Method,
    endpoint: &str,
    options: &RequestOptions,
) -> CallResult {
    debug!("Calling {} {}", method, endpoint);

    let response = match client.request(method.clone(), endpoint, options).await {
        Ok(response) => response,
        Err(e) => {
            let result = classify_error(&e);
            error!("{} {} failed: {}", method, endpoint, e);
            return result;
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to read body of {} {}: {}", method, endpoint, e);
            return classify_error(&DqError::Network(e));
        }
    };

    if !status.is_success() {
        error!("{} {} returned HTTP {}", method, endpoint, status.as_u16());
        return CallResult::failure(
            FailureKind::Http,
            format!("HTTP {}: {}", status.as_u16(), excerpt(&body, ERROR_BODY_LIMIT)),
        );
    }

    match serde_json::from_str::<Value>(&body) {
        Ok(data) => CallResult::Success { data },
        Err(e) => {
            error!("{} {} returned invalid JSON: {}", method, endpoint, e);
            CallResult::failure(FailureKind::JsonDecode, format!("Invalid JSON response: {e}"))
        }
    }
}

fn classify_error(err: &DqError) -> CallResult {
    match err {
        DqError::Network(e) if e.is_connect() => {
            CallResult::failure(FailureKind::Connection, format!("Connection error: {e}"))
        }
        DqError::Network(e) if e.is_timeout() => {
            CallResult::failure(FailureKind::Timeout, format!("Request timeout: {e}"))
        }
        DqError::Network(e) if e.is_decode() => {
            CallResult::failure(FailureKind::JsonDecode, format!("Invalid JSON response: {e}"))
        }
        DqError::Network(e) => {
            CallResult::failure(FailureKind::Transport, format!("Request failed: {e}"))
        }
        DqError::Json(e) => {
            CallResult::failure(FailureKind::JsonDecode, format!("Invalid JSON response: {e}"))
        }
        other => CallResult::failure(FailureKind::Unexpected, format!("Unexpected error: {other}")),
    }
}

/// First `limit` characters of `text`, on a char boundary
fn excerpt(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::types::DqConnection;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str, timeout_secs: u64) -> DqClient {
        let connection = DqConnection {
            base_url: base_url.to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            issuer: "public".to_string(),
        };
        let http = HttpConfig {
            timeout_secs,
            insecure_skip_verify: false,
        };
        DqClient::new(connection, &http).unwrap()
    }

    async fn signed_in_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc" })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_success_wraps_json() {
        let server = signed_in_server().await;
        Mock::given(method("GET"))
            .and(path("/v2/getrecentruns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "dataset": "ds" }])))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 5);
        let result = call(&client, Method::GET, "/v2/getrecentruns", &RequestOptions::new()).await;

        assert_eq!(
            result,
            CallResult::Success {
                data: json!([{ "dataset": "ds" }])
            }
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "success": true, "data": [{ "dataset": "ds" }] })
        );
    }

    #[tokio::test]
    async fn test_server_error_is_http_failure() {
        let server = signed_in_server().await;
        let long_body = "x".repeat(800);
        Mock::given(method("GET"))
            .and(path("/v2/gethoot"))
            .respond_with(ResponseTemplate::new(500).set_body_string(long_body))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 5);
        let result = call(&client, Method::GET, "/v2/gethoot", &RequestOptions::new()).await;

        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Http);
                assert!(message.starts_with("HTTP 500: "));
                assert_eq!(message.len(), "HTTP 500: ".len() + ERROR_BODY_LIMIT);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_failure() {
        let server = signed_in_server().await;
        Mock::given(method("GET"))
            .and(path("/v2/getalerts"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 5);
        let result = call(&client, Method::GET, "/v2/getalerts", &RequestOptions::new()).await;

        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::JsonDecode);
                assert!(message.starts_with("Invalid JSON response"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_timeout_failure() {
        let server = signed_in_server().await;
        Mock::given(method("GET"))
            .and(path("/v2/getrecentruns"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 1);
        let result = call(&client, Method::GET, "/v2/getrecentruns", &RequestOptions::new()).await;

        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Timeout);
                assert!(message.starts_with("Request timeout"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_connection_failure() {
        // Bind then drop a listener so the port is known to be closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"), 5);
        let result = call(&client, Method::GET, "/v2/getrecentruns", &RequestOptions::new()).await;

        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Connection);
                assert!(message.starts_with("Connection error"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_in_without_token_is_unexpected_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 5);
        let result = call(&client, Method::GET, "/v2/getrecentruns", &RequestOptions::new()).await;

        assert_eq!(
            result.error_message().map(|m| m.starts_with("Unexpected error")),
            Some(true)
        );
    }

    #[test]
    fn test_failure_serialization() {
        let result = CallResult::failure(FailureKind::Connection, "Connection error: refused");
        assert_eq!(
            result.to_json_string(),
            r#"{"success":false,"error":"Connection error: refused"}"#
        );
        assert!(!result.is_success());
        assert_eq!(FailureKind::JsonDecode.to_string(), "json-decode-error");
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("short", 500), "short");
    }
}
