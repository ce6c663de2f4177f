//! Configuration management for the Collibra DQ MCP server

use crate::types::DqConnection;
use crate::DqError;
use serde::{Deserialize, Serialize};

/// Source name used by the SQL, job and catalog tools when `DQ_CXN` is unset
pub const DEFAULT_SOURCE: &str = "BIGQUERY";

/// Main configuration for the DQ MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DqConfig {
    /// DQ backend connection
    pub connection: DqConnection,

    /// Connection/source name passed to the SQL, job and catalog endpoints
    pub default_source: String,

    /// HTTP transport configuration
    pub http: HttpConfig,

    /// MCP transport the server listens on
    pub transport: TransportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-call timeout (seconds)
    pub timeout_secs: u64,

    /// Skip TLS certificate validation
    pub insecure_skip_verify: bool,
}

/// MCP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// `stdio` or `http` (streamable HTTP)
    pub mode: TransportMode,

    /// Bind address for `http`
    pub host: String,

    /// Listen port for `http`
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Stdio,
    Http,
}

impl std::str::FromStr for TransportMode {
    type Err = DqError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" | "streamable-http" => Ok(Self::Http),
            other => Err(DqError::Config(format!(
                "unknown transport '{other}', expected stdio or http"
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for DqConfig {
    fn default() -> Self {
        Self {
            connection: DqConnection::default(),
            default_source: DEFAULT_SOURCE.to_string(),
            http: HttpConfig::default(),
            transport: TransportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            insecure_skip_verify: false,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Stdio,
            host: "0.0.0.0".to_string(),
            port: 8765,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl DqConfig {
    /// Load configuration from an optional file, apply `DQ_*` environment
    /// overrides and validate the result.
    pub fn load(config_path: Option<&str>) -> crate::Result<Self> {
        let mut config = Self::load_or_default(config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validated()
    }

    /// Load configuration from file or create default
    pub fn load_or_default(config_path: Option<&str>) -> crate::Result<Self> {
        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let config: DqConfig = serde_json::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &str) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Overlay values found through `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DQ_URL") {
            self.connection.base_url = url;
        }
        if let Some(username) = lookup("DQ_USERNAME") {
            self.connection.username = username;
        }
        if let Some(password) = lookup("DQ_PASSWORD") {
            self.connection.password = password;
        }
        if let Some(issuer) = lookup("DQ_ISS") {
            self.connection.issuer = issuer;
        }
        if let Some(source) = lookup("DQ_CXN") {
            self.default_source = source;
        }
        if let Some(timeout) = lookup("DQ_TIMEOUT_SECS") {
            self.http.timeout_secs = timeout.trim().parse().map_err(|_| {
                DqError::Config(format!("DQ_TIMEOUT_SECS is not a number: {timeout}"))
            })?;
        }
        if let Some(flag) = lookup("DQ_INSECURE_SKIP_VERIFY") {
            self.http.insecure_skip_verify = parse_flag(&flag).ok_or_else(|| {
                DqError::Config(format!("DQ_INSECURE_SKIP_VERIFY is not a boolean: {flag}"))
            })?;
        }
        if let Some(mode) = lookup("DQ_TRANSPORT") {
            self.transport.mode = mode.parse()?;
        }
        if let Some(host) = lookup("DQ_HOST") {
            self.transport.host = host;
        }
        if let Some(port) = lookup("DQ_PORT") {
            self.transport.port = port
                .trim()
                .parse()
                .map_err(|_| DqError::Config(format!("DQ_PORT is not a port number: {port}")))?;
        }
        if let Some(level) = lookup("DQ_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("DQ_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Check required values and normalize the base URL
    pub fn validated(mut self) -> crate::Result<Self> {
        let missing: Vec<&str> = [
            ("DQ_URL", &self.connection.base_url),
            ("DQ_USERNAME", &self.connection.username),
            ("DQ_PASSWORD", &self.connection.password),
            ("DQ_ISS", &self.connection.issuer),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(DqError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.default_source.trim().is_empty() {
            self.default_source = DEFAULT_SOURCE.to_string();
        }

        if self.http.timeout_secs == 0 {
            return Err(DqError::Config("http.timeout_secs must be positive".to_string()));
        }

        if self.transport.mode == TransportMode::Http {
            if self.transport.port == 0 {
                return Err(DqError::Config("transport.port must be positive".to_string()));
            }
            if self.transport.host.trim().is_empty() {
                return Err(DqError::Config("transport.host is empty".to_string()));
            }
        }

        self.connection.base_url = normalize_base_url(&self.connection.base_url)?;
        Ok(self)
    }
}

/// Normalize a backend URL for consistent endpoint joining
pub fn normalize_base_url(url: &str) -> crate::Result<String> {
    let trimmed = url.trim();

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = url::Url::parse(&with_scheme)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DqError::Config(format!(
            "unsupported URL scheme '{}' in {trimmed}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(DqError::Config(format!("URL has no host: {trimmed}")));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
