//! Shaping of DQ API payloads into tool output strings

use crate::types::{DataAssetPage, JobQueuePage, Rule, RuleSummary, SqlResult};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Rows shown by [`sql_table`] before truncating
pub const MAX_TABLE_ROWS: usize = 10;

/// Decode a success payload against its declared schema
pub fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, String> {
    serde_json::from_value(data.clone()).map_err(|e| e.to_string())
}

/// `{"success": false, "error": "Failed to parse response: ..."}`
pub fn parse_failure(reason: &str) -> String {
    json!({
        "success": false,
        "error": format!("Failed to parse response: {reason}")
    })
    .to_string()
}

/// Render a `/v2/getsqlresult` payload as a text table headed by the query
pub fn sql_table(sql: &str, data: &Value) -> String {
    let result: SqlResult = match decode(data) {
        Ok(result) => result,
        Err(e) => return parse_failure(&e),
    };

    let headers: Vec<String> = result.schema.iter().map(|c| c.name.clone()).collect();

    let mut rows: Vec<Vec<&Value>> = Vec::with_capacity(result.rows.len());
    for (idx, row) in result.rows.iter().enumerate() {
        if row.len() != headers.len() {
            return parse_failure(&format!(
                "row {} has {} values, expected {} columns",
                idx,
                row.len(),
                headers.len()
            ));
        }
        rows.push(row.iter().map(|cell| &cell.col_value).collect());
    }

    let total = rows.len();
    let shown = &rows[..total.min(MAX_TABLE_ROWS)];

    let mut output = format!("Results for: `{sql}`\n\n");
    output.push_str(&render_table(&headers, shown));

    if total > MAX_TABLE_ROWS {
        output.push_str(&format!("\n\n*Showing {MAX_TABLE_ROWS} of {total} rows*"));
    }

    output
}

/// Summaries of `/v3/rules/{dataset}`, or a "no rules" message. A `null` or
/// `{}` body counts as no rules.
pub fn rules_summary(dataset: &str, data: &Value) -> String {
    let rules: Vec<Rule> = match data {
        Value::Null => Vec::new(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        _ => match decode(data) {
            Ok(rules) => rules,
            Err(e) => return parse_failure(&e),
        },
    };

    if rules.is_empty() {
        return json!({
            "success": true,
            "message": format!("No rules found for dataset: {dataset}")
        })
        .to_string();
    }

    let summaries: Vec<RuleSummary> = rules.into_iter().map(RuleSummary::from).collect();
    json!({ "success": true, "data": summaries }).to_string()
}

/// Data assets from a catalog search page
pub fn catalog_summary(data: &Value) -> String {
    let page: DataAssetPage = match decode(data) {
        Ok(page) => page,
        Err(e) => return parse_failure(&e),
    };

    json!({
        "success": true,
        "count": page.data_asset_list.len(),
        "data": page.data_asset_list
    })
    .to_string()
}

/// Dataset, run id and status of each queued job
pub fn job_queue_summary(data: &Value) -> String {
    let page: JobQueuePage = match decode(data) {
        Ok(page) => page,
        Err(e) => return parse_failure(&e),
    };

    json!({
        "success": true,
        "count": page.data.len(),
        "data": page.data
    })
    .to_string()
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Presto-style table: ` a | b ` rows under a `---+---` rule. Columns whose
/// non-null cells are all numbers or numeric strings are right aligned.
fn render_table(headers: &[String], rows: &[Vec<&Value>]) -> String {
    let numeric: Vec<bool> = (0..headers.len())
        .map(|col| {
            let mut values = rows.iter().map(|row| row[col]).filter(|v| !v.is_null()).peekable();
            values.peek().is_some() && values.all(is_numeric)
        })
        .collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|v| cell_text(v)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            cells
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |values: &[String]| -> String {
        values
            .iter()
            .enumerate()
            .map(|(col, value)| {
                let width = widths[col];
                if numeric[col] {
                    format!(" {value:>width$} ")
                } else {
                    format!(" {value:<width$} ")
                }
            })
            .collect::<Vec<_>>()
            .join("|")
            .trim_end()
            .to_string()
    };

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(format_row(headers));
    lines.push(separator);
    lines.extend(cells.iter().map(|row| format_row(row.as_slice())));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_payload(rows: usize) -> Value {
        let rows: Vec<Value> = (0..rows)
            .map(|i| json!([{ "colValue": format!("a{i}") }, { "colValue": i }]))
            .collect();
        json!({
            "schema": [{ "name": "a" }, { "name": "b" }],
            "rows": rows
        })
    }

    #[test]
    fn test_sql_table_truncates_to_ten_rows() {
        let output = sql_table("select a, b from t", &sql_payload(12));

        assert!(output.starts_with("Results for: `select a, b from t`\n\n"));

        let lines: Vec<&str> = output.lines().collect();
        let header = lines[2];
        assert!(header.contains('a') && header.contains('b') && header.contains('|'));
        assert!(lines[3].chars().all(|c| c == '-' || c == '+'));

        let data_rows = lines[4..].iter().take_while(|l| !l.is_empty()).count();
        assert_eq!(data_rows, 10);

        assert!(output.ends_with("*Showing 10 of 12 rows*"));
    }

    #[test]
    fn test_sql_table_without_truncation() {
        let output = sql_table("select 1", &sql_payload(3));

        assert!(!output.contains("Showing"));
        assert_eq!(output.lines().count(), 2 + 2 + 3);
    }

    #[test]
    fn test_sql_table_layout() {
        let data = json!({
            "schema": [{ "name": "name" }, { "name": "n" }],
            "rows": [
                [{ "colValue": "alpha" }, { "colValue": 1 }],
                [{ "colValue": null }, { "colValue": 250 }]
            ]
        });

        let output = sql_table("q", &data);
        let table: Vec<&str> = output.lines().skip(2).collect();

        assert_eq!(
            table,
            vec![
                " name  |   n",
                "-------+-----",
                " alpha |   1",
                "       | 250",
            ]
        );
    }

    #[test]
    fn test_sql_table_right_aligns_numeric_strings() {
        let data = json!({
            "schema": [{ "name": "dataset" }, { "name": "score" }],
            "rows": [
                [{ "colValue": "ds_a" }, { "colValue": "98.5" }],
                [{ "colValue": "ds_b" }, { "colValue": "7" }],
                [{ "colValue": "ds_c" }, { "colValue": null }]
            ]
        });

        let output = sql_table("q", &data);
        let table: Vec<&str> = output.lines().skip(2).collect();

        assert_eq!(
            table,
            vec![
                " dataset | score",
                "---------+-------",
                " ds_a    |  98.5",
                " ds_b    |     7",
                " ds_c    |",
            ]
        );
    }

    #[test]
    fn test_sql_table_missing_schema() {
        let output = sql_table("q", &json!({ "rows": [] }));
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["success"], false);
        assert!(parsed["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to parse response"));
    }

    #[test]
    fn test_sql_table_ragged_row() {
        let data = json!({
            "schema": [{ "name": "a" }, { "name": "b" }],
            "rows": [[{ "colValue": 1 }]]
        });
        let parsed: Value = serde_json::from_str(&sql_table("q", &data)).unwrap();
        assert_eq!(parsed["success"], false);
    }

    #[test]
    fn test_rules_summary() {
        let data = json!([{
            "ruleNm": "r1",
            "ruleValue": "select 1",
            "ruleType": "SQLF",
            "points": 5
        }]);

        let parsed: Value = serde_json::from_str(&rules_summary("ds", &data)).unwrap();
        assert_eq!(
            parsed,
            json!({
                "success": true,
                "data": [{ "name": "r1", "sql": "select 1", "type": "SQLF", "points": 5 }]
            })
        );
    }

    #[test]
    fn test_rules_summary_empty() {
        let parsed: Value = serde_json::from_str(&rules_summary("ds", &json!([]))).unwrap();

        assert_eq!(
            parsed,
            json!({ "success": true, "message": "No rules found for dataset: ds" })
        );
        assert!(parsed.get("data").is_none());
    }

    #[test]
    fn test_rules_summary_missing_fields_are_null() {
        let parsed: Value =
            serde_json::from_str(&rules_summary("ds", &json!([{ "ruleNm": "r2" }]))).unwrap();

        assert_eq!(
            parsed["data"][0],
            json!({ "name": "r2", "sql": null, "type": null, "points": null })
        );
    }

    #[test]
    fn test_rules_summary_null_or_empty_object() {
        for data in [Value::Null, json!({})] {
            let parsed: Value = serde_json::from_str(&rules_summary("ds", &data)).unwrap();
            assert_eq!(
                parsed,
                json!({ "success": true, "message": "No rules found for dataset: ds" })
            );
        }
    }

    #[test]
    fn test_rules_summary_keeps_non_string_fields() {
        let data = json!([
            { "ruleNm": 42, "ruleValue": "select 1", "ruleType": { "code": "SQLF" }, "points": "5" },
            { "ruleNm": "r2", "ruleValue": "select 2" }
        ]);
        let parsed: Value = serde_json::from_str(&rules_summary("ds", &data)).unwrap();

        assert_eq!(parsed["success"], true);
        assert_eq!(
            parsed["data"][0],
            json!({ "name": 42, "sql": "select 1", "type": { "code": "SQLF" }, "points": "5" })
        );
        assert_eq!(parsed["data"][1]["name"], "r2");
    }

    #[test]
    fn test_rules_summary_not_a_list() {
        let parsed: Value =
            serde_json::from_str(&rules_summary("ds", &json!({ "error": "x" }))).unwrap();
        assert_eq!(parsed["success"], false);
    }

    #[test]
    fn test_catalog_summary() {
        let data = json!({ "dataAssetList": [{ "dataset": "a" }, { "dataset": "b" }] });
        let parsed: Value = serde_json::from_str(&catalog_summary(&data)).unwrap();

        assert_eq!(parsed["count"], 2);
        assert_eq!(parsed["data"][1]["dataset"], "b");

        let parsed: Value = serde_json::from_str(&catalog_summary(&json!({}))).unwrap();
        assert_eq!(parsed["count"], 0);
        assert_eq!(parsed["data"], json!([]));
    }

    #[test]
    fn test_job_queue_summary() {
        let data = json!({
            "data": [
                { "dataset": "ds", "runId": "2025-01-23", "status": "RUNNING", "agent": 3 },
                { "dataset": "other" }
            ]
        });
        let parsed: Value = serde_json::from_str(&job_queue_summary(&data)).unwrap();

        assert_eq!(parsed["count"], 2);
        assert_eq!(
            parsed["data"][0],
            json!({ "dataset": "ds", "runId": "2025-01-23", "status": "RUNNING" })
        );
        assert_eq!(
            parsed["data"][1],
            json!({ "dataset": "other", "runId": null, "status": null })
        );

        let parsed: Value = serde_json::from_str(&job_queue_summary(&json!([1, 2]))).unwrap();
        assert_eq!(parsed["success"], false);
    }
}
