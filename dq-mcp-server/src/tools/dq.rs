//! Data quality tool provider backed by the DQ REST API

use dq_mcp_shared::format::{catalog_summary, job_queue_summary, rules_summary, sql_table};
use dq_mcp_shared::{
    call, endpoint_with_segment, CallResult, DatasetDefinition, DqClient, DqConfig, DqError,
    NewAlert, NewRule, RequestOptions, Result,
};
use pulseengine_mcp_protocol::Tool;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{optional_int, optional_str, required_str, tool};

pub const TOOL_NAMES: &[&str] = &[
    "get_recent_runs",
    "run_sql",
    "get_rules_by_dataset",
    "run_dq_job",
    "search_catalog",
    "get_jobs_in_queue",
    "save_rule",
    "get_dataset_definition",
    "get_hoot_results",
    "get_alerts",
    "save_alert",
];

pub struct DqToolProvider {
    client: Arc<DqClient>,
    default_source: String,
}

impl DqToolProvider {
    pub fn new(client: Arc<DqClient>, config: &DqConfig) -> Self {
        Self {
            client,
            default_source: config.default_source.clone(),
        }
    }

    pub fn handles(&self, name: &str) -> bool {
        TOOL_NAMES.contains(&name)
    }

    pub fn list_tools(&self) -> Result<Vec<Tool>> {
        let tools = vec![
            tool(
                "get_recent_runs",
                "Get recent DQ job runs. Returns a list of recently executed data quality jobs.",
                json!({}),
                &[],
            )?,
            tool(
                "run_sql",
                "Execute a SQL query and return the results as a text table (max 10 rows)",
                json!({
                    "sql": { "type": "string", "description": "The SQL query to execute" }
                }),
                &["sql"],
            )?,
            tool(
                "get_rules_by_dataset",
                "Get all data quality rules for a dataset with their names and SQL definitions",
                json!({
                    "dataset": {
                        "type": "string",
                        "description": "The dataset name (e.g., 'samples.austin_311')"
                    }
                }),
                &["dataset"],
            )?,
            tool(
                "run_dq_job",
                "Register a dataset definition and run a DQ job",
                json!({
                    "dataset": {
                        "type": "string",
                        "description": "Dataset name (e.g., 'my_project.my_table')"
                    },
                    "run_id": {
                        "type": "string",
                        "description": "Run ID, typically a date (e.g., '2025-01-23')"
                    },
                    "sql": { "type": "string", "description": "Source SQL query for the dataset" }
                }),
                &["dataset", "run_id", "sql"],
            )?,
            tool(
                "search_catalog",
                "Search the data catalog for datasets",
                json!({
                    "search_string": {
                        "type": "string",
                        "description": "Text to search for in dataset names"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum results to return (default 50)",
                        "minimum": 1
                    }
                }),
                &["search_string"],
            )?,
            tool(
                "get_jobs_in_queue",
                "Get DQ jobs currently in the queue with dataset, runId and status",
                json!({
                    "limit": {
                        "type": "integer",
                        "description": "Maximum jobs to return (default 10)",
                        "minimum": 1
                    },
                    "status": {
                        "type": "string",
                        "description": "Filter by status (empty for all)"
                    }
                }),
                &[],
            )?,
            tool(
                "save_rule",
                "Create a new data quality rule for a dataset",
                json!({
                    "dataset": { "type": "string", "description": "Dataset name to attach the rule to" },
                    "rule_name": { "type": "string", "description": "Name for the rule" },
                    "rule_sql": {
                        "type": "string",
                        "description": "SQL query that defines the rule (records returned = failures)"
                    },
                    "points": { "type": "integer", "description": "Point value for the rule (default 1)" },
                    "perc": { "type": "integer", "description": "Percentage threshold (default 1)" }
                }),
                &["dataset", "rule_name", "rule_sql"],
            )?,
            tool(
                "get_dataset_definition",
                "Get the configuration/definition for a dataset, including connection, query and settings",
                json!({
                    "dataset": { "type": "string", "description": "Dataset name" }
                }),
                &["dataset"],
            )?,
            tool(
                "get_hoot_results",
                "Get DQ job results (hoot) for a specific dataset run, including scores and findings",
                json!({
                    "dataset": { "type": "string", "description": "Dataset name" },
                    "run_id": {
                        "type": "string",
                        "description": "Run ID (typically a date like '2025-01-23')"
                    }
                }),
                &["dataset", "run_id"],
            )?,
            tool(
                "get_alerts",
                "Get all alerts configured for a dataset",
                json!({
                    "dataset": { "type": "string", "description": "Dataset name" }
                }),
                &["dataset"],
            )?,
            tool(
                "save_alert",
                "Create a new email alert for a dataset",
                json!({
                    "dataset": { "type": "string", "description": "Dataset name" },
                    "alert_name": { "type": "string", "description": "Name for the alert" },
                    "condition": { "type": "string", "description": "Alert condition expression" },
                    "email": { "type": "string", "description": "Email address to send alerts to" },
                    "message": { "type": "string", "description": "Custom alert message (optional)" }
                }),
                &["dataset", "alert_name", "condition", "email"],
            )?,
        ];

        debug!("DQ provider listed {} tools", tools.len());
        Ok(tools)
    }

    /// Dispatch a tool call. Argument errors are returned as `Err`; remote
    /// failures are part of the returned text.
    pub async fn call(&self, name: &str, args: &Value) -> Result<String> {
        debug!("DQ provider calling tool: {} with args: {}", name, args);

        match name {
            "get_recent_runs" => Ok(self.get_recent_runs().await),
            "run_sql" => Ok(self.run_sql(required_str(args, "sql")?).await),
            "get_rules_by_dataset" => {
                self.get_rules_by_dataset(required_str(args, "dataset")?).await
            }
            "run_dq_job" => {
                let dataset = required_str(args, "dataset")?;
                let run_id = required_str(args, "run_id")?;
                let sql = required_str(args, "sql")?;
                self.run_dq_job(dataset, run_id, sql).await
            }
            "search_catalog" => {
                let search_string = required_str(args, "search_string")?;
                let limit = optional_int(args, "limit", 50)?;
                Ok(self.search_catalog(search_string, limit).await)
            }
            "get_jobs_in_queue" => {
                let limit = optional_int(args, "limit", 10)?;
                let status = optional_str(args, "status", "")?;
                Ok(self.get_jobs_in_queue(limit, status).await)
            }
            "save_rule" => {
                let rule = NewRule::sql(
                    required_str(args, "dataset")?,
                    required_str(args, "rule_name")?,
                    required_str(args, "rule_sql")?,
                    optional_int(args, "points", 1)?,
                    optional_int(args, "perc", 1)?,
                );
                self.save_rule(&rule).await
            }
            "get_dataset_definition" => {
                Ok(self.get_dataset_definition(required_str(args, "dataset")?).await)
            }
            "get_hoot_results" => {
                let dataset = required_str(args, "dataset")?;
                let run_id = required_str(args, "run_id")?;
                Ok(self.get_hoot_results(dataset, run_id).await)
            }
            "get_alerts" => Ok(self.get_alerts(required_str(args, "dataset")?).await),
            "save_alert" => {
                let alert = NewAlert::email(
                    required_str(args, "dataset")?,
                    required_str(args, "alert_name")?,
                    required_str(args, "condition")?,
                    required_str(args, "email")?,
                    optional_str(args, "message", "")?,
                );
                self.save_alert(&alert).await
            }
            _ => {
                error!("Unknown DQ tool: {}", name);
                Err(DqError::InvalidOperation(format!("DQ tool '{}' not found", name)))
            }
        }
    }

    async fn get_recent_runs(&self) -> String {
        call(&self.client, Method::GET, "/v2/getrecentruns", &RequestOptions::new())
            .await
            .to_json_string()
    }

    async fn run_sql(&self, sql: &str) -> String {
        let options = RequestOptions::new()
            .query("sql", sql)
            .query("cxn", self.default_source.as_str());

        match call(&self.client, Method::POST, "/v2/getsqlresult", &options).await {
            CallResult::Success { data } => sql_table(sql, &data),
            failure => failure.to_json_string(),
        }
    }

    async fn get_rules_by_dataset(&self, dataset: &str) -> Result<String> {
        let endpoint = endpoint_with_segment("/v3/rules", dataset)?;

        Ok(
            match call(&self.client, Method::GET, &endpoint, &RequestOptions::new()).await {
                CallResult::Success { data } => rules_summary(dataset, &data),
                failure => failure.to_json_string(),
            },
        )
    }

    async fn run_dq_job(&self, dataset: &str, run_id: &str, sql: &str) -> Result<String> {
        let definition = DatasetDefinition::pushdown(dataset, run_id, sql, &self.default_source);
        let options = RequestOptions::new().json(&definition)?;

        let registration = call(&self.client, Method::PUT, "/v3/datasetDefs", &options).await;
        if let CallResult::Failure { message, .. } = registration {
            error!("Registration of {} failed: {}", dataset, message);
            return Ok(json!({
                "success": false,
                "error": format!("Registration failed: {message}")
            })
            .to_string());
        }

        info!("Registered {} for run {}, starting job", dataset, run_id);
        let options = RequestOptions::new()
            .query("dataset", dataset)
            .query("runDate", run_id);

        Ok(call(&self.client, Method::POST, "/v3/jobs/run", &options)
            .await
            .to_json_string())
    }

    async fn search_catalog(&self, search_string: &str, limit: i64) -> String {
        let options = RequestOptions::new()
            .query("draw", "3")
            .query("start", "0")
            .query("length", limit.to_string())
            .query("search[value]", search_string)
            .query("filterPushdownPullup", "1")
            .query("order[0][column]", "0")
            .query("order[0][dir]", "asc")
            .query("filterSource", self.default_source.as_str());

        let endpoint = "/v2/getdataassetsarrforserversidewithmultifilters";
        match call(&self.client, Method::GET, endpoint, &options).await {
            CallResult::Success { data } => catalog_summary(&data),
            failure => failure.to_json_string(),
        }
    }

    async fn get_jobs_in_queue(&self, limit: i64, status: &str) -> String {
        let options = RequestOptions::new()
            .query("jobStatus", status)
            .query("limit", limit.to_string());

        match call(&self.client, Method::GET, "/v2/getowlcheckq", &options).await {
            CallResult::Success { data } => job_queue_summary(&data),
            failure => failure.to_json_string(),
        }
    }

    async fn save_rule(&self, rule: &NewRule) -> Result<String> {
        let options = RequestOptions::new().json(rule)?;
        Ok(call(&self.client, Method::POST, "/v3/rules", &options)
            .await
            .to_json_string())
    }

    async fn get_dataset_definition(&self, dataset: &str) -> String {
        let options = RequestOptions::new().query("dataset", dataset);
        call(&self.client, Method::GET, "/v2/owl-options/get", &options)
            .await
            .to_json_string()
    }

    async fn get_hoot_results(&self, dataset: &str, run_id: &str) -> String {
        let options = RequestOptions::new()
            .query("dataset", dataset)
            .query("runId", run_id);
        call(&self.client, Method::GET, "/v2/gethoot", &options)
            .await
            .to_json_string()
    }

    async fn get_alerts(&self, dataset: &str) -> String {
        let options = RequestOptions::new().query("dataset", dataset);
        call(&self.client, Method::GET, "/v2/getalerts", &options)
            .await
            .to_json_string()
    }

    async fn save_alert(&self, alert: &NewAlert) -> Result<String> {
        let options = RequestOptions::new().json(alert)?;
        Ok(call(&self.client, Method::POST, "/v3/alerts", &options)
            .await
            .to_json_string())
    }
}
