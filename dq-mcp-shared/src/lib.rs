//! Shared types and the authenticated client for the Collibra DQ MCP server

pub mod auth;
pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod types;

pub use auth::Session;
pub use call::{call, CallResult, FailureKind};
pub use client::{endpoint_with_segment, DqClient, RequestOptions};
pub use config::{
    DqConfig, HttpConfig, LoggingConfig, TransportConfig, TransportMode, DEFAULT_SOURCE,
};
pub use error::{DqError, Result};
pub use types::*;
