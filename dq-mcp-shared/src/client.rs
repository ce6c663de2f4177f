//! Authenticated HTTP client for the Collibra DQ API
//!
//! Signs in lazily on the first request, caches the bearer token and signs in
//! again once when the backend answers 401.

use crate::auth::Session;
use crate::config::{DqConfig, HttpConfig};
use crate::types::{DqConnection, SignInRequest, SignInResponse};
use crate::{DqError, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SIGN_IN_ENDPOINT: &str = "/auth/signin";

/// Query parameters and JSON body for a DQ request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Join `prefix` and one caller-supplied path segment, percent-encoding the
/// segment so `/`, `?` and `#` stay inside it.
pub fn endpoint_with_segment(prefix: &str, segment: &str) -> Result<String> {
    if matches!(segment, "" | "." | "..") {
        return Err(DqError::InvalidOperation(format!(
            "'{segment}' is not a valid path segment"
        )));
    }

    let mut url = url::Url::parse("http://localhost/")?;
    url.path_segments_mut()
        .map_err(|_| DqError::InvalidOperation("URL cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(prefix.split('/').filter(|s| !s.is_empty()))
        .push(segment);
    Ok(url.path().to_string())
}

/// DQ API client
pub struct DqClient {
    connection: DqConnection,
    http: Client,
    session: Mutex<Option<Session>>,
}

impl DqClient {
    /// Create a client; no network traffic happens until the first request
    pub fn new(mut connection: DqConnection, http_config: &HttpConfig) -> Result<Self> {
        connection.base_url = connection.base_url.trim_end_matches('/').to_string();

        let mut builder = Client::builder().timeout(Duration::from_secs(http_config.timeout_secs));

        if http_config.insecure_skip_verify {
            warn!(
                "TLS certificate validation is disabled for {}",
                connection.base_url
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(DqError::Network)?;

        Ok(Self {
            connection,
            http,
            session: Mutex::new(None),
        })
    }

    pub fn from_config(config: &DqConfig) -> Result<Self> {
        Self::new(config.connection.clone(), &config.http)
    }

    pub fn base_url(&self) -> &str {
        &self.connection.base_url
    }

    /// Whether a token is currently cached
    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Sign in and replace the cached session. On failure the previous state
    /// is kept.
    pub async fn authenticate(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        *session = Some(self.sign_in().await?);
        Ok(())
    }

    /// Send an authenticated request. A 401 triggers one sign-in and one
    /// retry; every other status is returned untouched.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        let url = self.url(endpoint);
        let session = self.current_session().await?;

        debug!("{} {}", method, url);
        let response = self.send(&method, &url, options, session.headers()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("{} {} returned 401, re-authenticating", method, url);
        let session = self.reauthenticate(session.token()).await?;
        self.send(&method, &url, options, session.headers()).await
    }

    pub async fn get(&self, endpoint: &str, options: &RequestOptions) -> Result<Response> {
        self.request(Method::GET, endpoint, options).await
    }

    pub async fn post(&self, endpoint: &str, options: &RequestOptions) -> Result<Response> {
        self.request(Method::POST, endpoint, options).await
    }

    pub async fn put(&self, endpoint: &str, options: &RequestOptions) -> Result<Response> {
        self.request(Method::PUT, endpoint, options).await
    }

    pub async fn delete(&self, endpoint: &str, options: &RequestOptions) -> Result<Response> {
        self.request(Method::DELETE, endpoint, options).await
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.connection.base_url, endpoint)
        } else {
            format!("{}/{}", self.connection.base_url, endpoint)
        }
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let mut request = self.http.request(method.clone(), url).headers(headers.clone());

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Cached session, signing in first if there is none. The lock is held
    /// across the sign-in so concurrent first calls share one token.
    async fn current_session(&self) -> Result<Session> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        let session = self.sign_in().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Replace the session whose token was rejected. If another caller
    /// already refreshed it, the newer session is reused.
    async fn reauthenticate(&self, rejected_token: &str) -> Result<Session> {
        let mut guard = self.session.lock().await;
        if let Some(current) = guard.as_ref() {
            if current.token() != rejected_token {
                debug!("Session already refreshed by a concurrent request");
                return Ok(current.clone());
            }
        }

        let session = self.sign_in().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn sign_in(&self) -> Result<Session> {
        let url = self.url(SIGN_IN_ENDPOINT);
        info!(
            "Signing in to {} as {}",
            self.connection.base_url, self.connection.username
        );

        let credentials = SignInRequest {
            username: &self.connection.username,
            password: &self.connection.password,
            iss: &self.connection.issuer,
        };

        let response = self
            .http
            .post(&url)
            .json(&credentials)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let sign_in: SignInResponse = serde_json::from_str(&body)
            .map_err(|e| DqError::Auth(format!("sign-in response has no token: {e}")))?;

        Session::new(sign_in.token)
    }
}
