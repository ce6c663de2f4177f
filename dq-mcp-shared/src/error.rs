//! Error types for the Collibra DQ MCP server

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DqError>;

#[derive(Error, Debug)]
pub enum DqError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("MCP protocol error: {0}")]
    Mcp(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<pulseengine_mcp_server::BackendError> for DqError {
    fn from(err: pulseengine_mcp_server::BackendError) -> Self {
        DqError::Mcp(err.to_string())
    }
}

impl From<DqError> for pulseengine_mcp_protocol::Error {
    fn from(err: DqError) -> Self {
        match err {
            DqError::InvalidOperation(msg) => pulseengine_mcp_protocol::Error::invalid_params(msg),
            other => pulseengine_mcp_protocol::Error::internal_error(other.to_string()),
        }
    }
}
