//! Shared types for the Collibra DQ API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// DQ backend connection settings
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DqConnection {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub issuer: String,
}

impl fmt::Debug for DqConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DqConnection")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Body posted to `/auth/signin`
#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub iss: &'a str,
}

/// Response of `/auth/signin`
#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    pub token: String,
}

/// Response of `/v2/getsqlresult`
#[derive(Debug, Clone, Deserialize)]
pub struct SqlResult {
    pub schema: Vec<SqlColumn>,
    pub rows: Vec<Vec<SqlCell>>,
}

/// Column descriptor in a SQL result schema
#[derive(Debug, Clone, Deserialize)]
pub struct SqlColumn {
    pub name: String,
}

/// Single cell of a SQL result row
#[derive(Debug, Clone, Deserialize)]
pub struct SqlCell {
    #[serde(rename = "colValue")]
    pub col_value: Value,
}

/// Rule as returned by `/v3/rules/{dataset}`
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    #[serde(rename = "ruleNm")]
    pub rule_nm: Option<Value>,
    #[serde(rename = "ruleValue")]
    pub rule_value: Option<Value>,
    #[serde(rename = "ruleType")]
    pub rule_type: Option<Value>,
    pub points: Option<Value>,
}

/// Rule summary returned to tool callers
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuleSummary {
    pub name: Option<Value>,
    pub sql: Option<Value>,
    #[serde(rename = "type")]
    pub rule_type: Option<Value>,
    pub points: Option<Value>,
}

impl From<Rule> for RuleSummary {
    fn from(rule: Rule) -> Self {
        Self {
            name: rule.rule_nm,
            sql: rule.rule_value,
            rule_type: rule.rule_type,
            points: rule.points,
        }
    }
}

/// Response of `/v2/getdataassetsarrforserversidewithmultifilters`
#[derive(Debug, Clone, Deserialize)]
pub struct DataAssetPage {
    #[serde(rename = "dataAssetList", default)]
    pub data_asset_list: Vec<Value>,
}

/// Response of `/v2/getowlcheckq`
#[derive(Debug, Clone, Deserialize)]
pub struct JobQueuePage {
    #[serde(default)]
    pub data: Vec<QueuedJob>,
}

/// Job entry in the DQ check queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedJob {
    pub dataset: Option<String>,
    #[serde(rename = "runId")]
    pub run_id: Option<Value>,
    pub status: Option<Value>,
}

/// Body of `PUT /v3/datasetDefs`
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDefinition {
    pub dataset: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    pub pushdown: Pushdown,
    #[serde(rename = "agentId")]
    pub agent_id: AgentId,
    pub profile: ProfileToggle,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pushdown {
    #[serde(rename = "sourceQuery")]
    pub source_query: String,
    #[serde(rename = "connectionName")]
    pub connection_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentId {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileToggle {
    pub on: bool,
}

impl DatasetDefinition {
    /// Pushdown definition with the default agent and profiling off
    pub fn pushdown(dataset: &str, run_id: &str, sql: &str, connection: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            run_id: run_id.to_string(),
            pushdown: Pushdown {
                source_query: sql.to_string(),
                connection_name: connection.to_string(),
            },
            agent_id: AgentId { id: 0 },
            profile: ProfileToggle { on: false },
        }
    }
}

/// Body of `POST /v3/rules`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub dataset: String,
    pub rule_nm: String,
    pub rule_type: String,
    pub rule_value: String,
    pub points: i64,
    pub rule_repo: String,
    pub perc: i64,
    pub column_name: String,
    pub business_category: String,
    pub business_desc: String,
    pub dim_id: Option<i64>,
}

impl NewRule {
    /// Freeform SQL rule: rows returned by `rule_sql` count as failures
    pub fn sql(dataset: &str, rule_name: &str, rule_sql: &str, points: i64, perc: i64) -> Self {
        Self {
            dataset: dataset.to_string(),
            rule_nm: rule_name.to_string(),
            rule_type: "SQLF".to_string(),
            rule_value: rule_sql.to_string(),
            points,
            rule_repo: String::new(),
            perc,
            column_name: String::new(),
            business_category: String::new(),
            business_desc: String::new(),
            dim_id: None,
        }
    }
}

/// Body of `POST /v3/alerts`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub dataset: String,
    pub alert_nm: String,
    pub alert_cond: String,
    pub alert_format: String,
    pub alert_format_value: String,
    pub alert_msg: String,
    pub batch_name: String,
    pub add_rule_details: bool,
    pub active: bool,
    pub alert_types: Vec<String>,
}

impl NewAlert {
    /// Condition alert delivered by email; an empty message falls back to
    /// `"<condition> for <dataset>"`.
    pub fn email(dataset: &str, alert_name: &str, condition: &str, email: &str, message: &str) -> Self {
        let alert_msg = if message.is_empty() {
            format!("{condition} for {dataset}")
        } else {
            message.to_string()
        };

        Self {
            dataset: dataset.to_string(),
            alert_nm: alert_name.to_string(),
            alert_cond: condition.to_string(),
            alert_format: "EMAIL".to_string(),
            alert_format_value: email.to_string(),
            alert_msg,
            batch_name: String::new(),
            add_rule_details: true,
            active: true,
            alert_types: vec!["CONDITION".to_string()],
        }
    }
}
