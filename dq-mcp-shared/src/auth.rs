//! Session token state for the DQ backend

use crate::{DqError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

/// Bearer token obtained from `/auth/signin` together with the header set
/// derived from it. The two only exist together.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    headers: HeaderMap,
}

impl Session {
    /// Build a session from a freshly issued token
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(DqError::Auth("sign-in returned an empty token".to_string()));
        }

        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| DqError::Auth(format!("token is not a valid header value: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, bearer);

        Ok(Self { token, headers })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_headers() {
        let session = Session::new("abc").unwrap();

        assert_eq!(session.token(), "abc");
        assert_eq!(session.headers()[AUTHORIZATION], "Bearer abc");
        assert_eq!(session.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(session.headers()[ACCEPT], "application/json");
    }

    #[test]
    fn test_session_rejects_bad_tokens() {
        assert!(Session::new("").is_err());
        assert!(Session::new("abc\ndef").is_err());
    }
}
