//! Tool providers for the DQ MCP server

use chrono::Local;
use dq_mcp_shared::{DqClient, DqConfig, DqError, Result};
use pulseengine_mcp_protocol::{Content, Tool};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

pub mod dq;

use dq::DqToolProvider;

pub struct ToolProvider {
    dq_provider: DqToolProvider,
}

impl ToolProvider {
    pub fn new(client: Arc<DqClient>, config: &DqConfig) -> Self {
        Self {
            dq_provider: DqToolProvider::new(client, config),
        }
    }

    pub fn list_tools(&self) -> Result<Vec<Tool>> {
        let mut tools = self.list_system_tools()?;
        tools.extend(self.dq_provider.list_tools()?);

        debug!("Listed {} total tools", tools.len());
        Ok(tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<Vec<Content>> {
        let text = self.call_text(name, arguments).await?;
        Ok(vec![Content::text(text)])
    }

    /// Run a tool and return its raw text output
    pub async fn call_text(&self, name: &str, arguments: Option<Value>) -> Result<String> {
        debug!("Calling tool: {} with args: {:?}", name, arguments);

        let args = arguments.unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        match name {
            "get_todays_date" => Ok(todays_date()),
            name if self.dq_provider.handles(name) => self.dq_provider.call(name, &args).await,
            _ => {
                error!("Unknown tool: {}", name);
                Err(DqError::InvalidOperation(format!("Tool '{}' not found", name)))
            }
        }
    }

    fn list_system_tools(&self) -> Result<Vec<Tool>> {
        Ok(vec![tool(
            "get_todays_date",
            "Get today's date in YYYY-MM-DD format. Useful for run IDs and date parameters.",
            json!({}),
            &[],
        )?])
    }
}

/// Local date as `YYYY-MM-DD`
pub fn todays_date() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Build a tool descriptor with an object input schema
pub(crate) fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> Result<Tool> {
    let descriptor = json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required
        }
    });

    serde_json::from_value(descriptor).map_err(DqError::Json)
}

pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| DqError::InvalidOperation(format!("{} is required", key)))
}

pub(crate) fn optional_str<'a>(args: &'a Value, key: &str, default: &'a str) -> Result<&'a str> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_str()
            .ok_or_else(|| DqError::InvalidOperation(format!("{} must be a string", key))),
    }
}

pub(crate) fn optional_int(args: &Value, key: &str, default: i64) -> Result<i64> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| DqError::InvalidOperation(format!("{} must be an integer", key))),
    }
}
