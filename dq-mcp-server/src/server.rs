//! Main MCP server implementation using PulseEngine MCP framework

use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, info};

use pulseengine_mcp_protocol::*;
use pulseengine_mcp_server::{AuthConfig, McpBackend, McpServer, ServerConfig};

use dq_mcp_shared::{DqClient, DqConfig, DqError, Result, TransportConfig, TransportMode};

use crate::tools::ToolProvider;

pub struct DqMcpServer {
    client: Arc<DqClient>,
    tool_provider: Arc<ToolProvider>,
    transport: TransportConfig,
}

impl DqMcpServer {
    pub fn new(config: &DqConfig) -> Result<Self> {
        info!(
            "Initializing DQ MCP Server for {}",
            config.connection.base_url
        );

        let client = Arc::new(DqClient::from_config(config)?);
        let tool_provider = Arc::new(ToolProvider::new(client.clone(), config));

        Ok(Self {
            client,
            tool_provider,
            transport: config.transport.clone(),
        })
    }

    pub async fn run(self) -> Result<()> {
        let server_config = server_config(&self.transport);
        let backend = DqMcpBackend {
            inner: Arc::new(self),
        };

        let mut server = McpServer::new(backend, server_config)
            .await
            .map_err(|e| DqError::Mcp(format!("Failed to create server: {}", e)))?;

        server
            .run()
            .await
            .map_err(|e| DqError::Mcp(format!("Server run error: {}", e)))
    }
}

/// Framework settings for the selected transport. The framework's own API-key
/// layer stays off and keeps nothing on disk: clients are not authenticated
/// here, and the DQ backend session belongs to `DqClient`.
fn server_config(transport: &TransportConfig) -> ServerConfig {
    let transport_config = match transport.mode {
        TransportMode::Stdio => {
            info!("Starting PulseEngine MCP server with stdio transport");
            pulseengine_mcp_server::TransportConfig::Stdio
        }
        TransportMode::Http => {
            info!(
                "Starting PulseEngine MCP server with streamable HTTP transport on {}:{}",
                transport.host, transport.port
            );
            pulseengine_mcp_server::TransportConfig::StreamableHttp {
                port: transport.port,
                host: Some(transport.host.clone()),
            }
        }
    };

    ServerConfig {
        auth_config: AuthConfig {
            enabled: false,
            ..AuthConfig::memory()
        },
        transport_config,
        ..ServerConfig::default()
    }
}

#[derive(Clone)]
struct DqMcpBackend {
    inner: Arc<DqMcpServer>,
}

#[async_trait]
impl McpBackend for DqMcpBackend {
    type Config = ();
    type Error = DqError;

    async fn initialize(_: Self::Config) -> std::result::Result<Self, Self::Error> {
        Err(DqError::Config("Use DqMcpServer::new() instead".to_string()))
    }

    fn get_server_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "dq-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some("Collibra Data Quality MCP Server: run SQL, manage rules and alerts, and run and inspect DQ jobs.".to_string()),
        }
    }

    async fn health_check(&self) -> std::result::Result<(), Self::Error> {
        debug!(
            "Health check, authenticated: {}",
            self.inner.client.is_authenticated().await
        );
        Ok(())
    }

    async fn list_tools(
        &self,
        _request: PaginatedRequestParam,
    ) -> std::result::Result<ListToolsResult, Self::Error> {
        debug!("Listing tools");

        let tools = self.inner.tool_provider.list_tools()?;

        debug!("Found {} tools", tools.len());
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> std::result::Result<CallToolResult, Self::Error> {
        debug!("Calling tool: {}", request.name);

        let content = self
            .inner
            .tool_provider
            .call_tool(&request.name, request.arguments)
            .await?;

        debug!("Successfully called tool: {}", request.name);
        Ok(CallToolResult::success(content))
    }

    async fn list_resources(
        &self,
        _request: PaginatedRequestParam,
    ) -> std::result::Result<ListResourcesResult, Self::Error> {
        Ok(ListResourcesResult {
            resources: vec![],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> std::result::Result<ReadResourceResult, Self::Error> {
        Err(DqError::InvalidOperation(format!(
            "Resource '{}' not found",
            request.uri
        )))
    }

    async fn list_prompts(
        &self,
        _request: PaginatedRequestParam,
    ) -> std::result::Result<ListPromptsResult, Self::Error> {
        Ok(ListPromptsResult {
            prompts: vec![],
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
    ) -> std::result::Result<GetPromptResult, Self::Error> {
        Err(DqError::InvalidOperation(format!(
            "Prompt '{}' not found",
            request.name
        )))
    }
}
