//! Optional remote classification against an Ollama-style completion
//! endpoint. This stage is advisory: any failure (missing configuration,
//! connect error, non-200, garbled completion) falls back to the local
//! heuristics without surfacing to the caller.

use crate::classify::{ChartType, Classification};
use crate::table::Table;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MODEL: &str = "llama2";

#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

/// Shape the model is asked to reply with.
#[derive(Debug, Deserialize)]
struct RemoteVerdict {
    is_valid: bool,
    #[serde(default)]
    chart_type: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

impl RemoteClassifier {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Option<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .ok()?;
        Some(Self { base_url: base_url.into(), model: model.into(), client })
    }

    /// Built from `CHARTGEN_OLLAMA_URL` / `CHARTGEN_OLLAMA_MODEL`. Returns
    /// `None` when no URL is configured, which disables the remote stage.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CHARTGEN_OLLAMA_URL").ok()?;
        let model =
            std::env::var("CHARTGEN_OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Self::new(base_url, model)
    }

    /// One request/response exchange. `None` means "no usable answer, use
    /// the local heuristics".
    pub async fn classify(&self, query: &str, table: &Table) -> Option<Classification> {
        let prompt = build_prompt(query, table);
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let resp = match self.client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "remote classifier unreachable");
                return None;
            }
        };
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "remote classifier returned an error status");
            return None;
        }
        let envelope: serde_json::Value = resp.json().await.ok()?;
        let completion = envelope.get("response")?.as_str()?;

        let verdict = parse_verdict(completion)?;
        if !verdict.is_valid {
            return Some(Classification::Clarify {
                message: verdict.message,
                suggestions: verdict.suggestions,
            });
        }
        let chart_type = ChartType::from_loose(verdict.chart_type.as_deref()?)?;
        Some(Classification::Actionable { chart_type })
    }
}

/// Models wrap JSON in prose more often than not; take the outermost
/// `{`..`}` span and try that.
fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_verdict(completion: &str) -> Option<RemoteVerdict> {
    let span = extract_json_span(completion)?;
    match serde_json::from_str::<RemoteVerdict>(span) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "remote classifier reply was not parseable");
            None
        }
    }
}

fn build_prompt(query: &str, table: &Table) -> String {
    format!(
        r#"You are a helpful data visualization assistant. Analyze the user's query and data to provide guidance.

User Query: "{query}"

Dataset Information:
Data shape: {shape}
Columns: {columns:?}
Numeric columns: {numeric:?}
Categorical columns: {categorical:?}
Sample data (first 3 rows):
{preview}
Available chart types: bar chart, line chart, scatter plot, pie chart, histogram, box plot, heatmap

Please respond in JSON format with:
{{
    "is_valid": true/false,
    "chart_type": "recommended_chart_type",
    "message": "helpful message to user",
    "suggestions": ["suggestion1", "suggestion2", "suggestion3"]
}}

Rules:
1. If the query mentions a valid chart type (bar, line, scatter, pie, histogram, box, heatmap), mark it as valid
2. If the query is unclear or mentions invalid chart types, mark it as invalid and provide helpful suggestions
3. Base suggestions on the actual data columns available
4. Be conversational and helpful in your message"#,
        query = query,
        shape = table.shape_string(),
        columns = table.column_names(),
        numeric = table.numeric_column_names(),
        categorical = table.categorical_column_names(),
        preview = table.preview(3),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_span_extraction() {
        assert_eq!(extract_json_span(r#"Sure! {"a": 1} done"#), Some(r#"{"a": 1}"#));
        assert_eq!(extract_json_span("no braces here"), None);
        assert_eq!(extract_json_span("} inverted {"), None);
        // nested objects keep the outermost span
        assert_eq!(
            extract_json_span(r#"x {"a": {"b": 2}} y"#),
            Some(r#"{"a": {"b": 2}}"#)
        );
    }

    #[test]
    fn verdict_parsing_tolerates_prose() {
        let reply = r#"Here you go:
            {"is_valid": true, "chart_type": "bar chart", "message": "ok", "suggestions": []}
            Hope that helps!"#;
        let v = parse_verdict(reply).unwrap();
        assert!(v.is_valid);
        assert_eq!(ChartType::from_loose(v.chart_type.as_deref().unwrap()), Some(ChartType::BarChart));
    }

    #[test]
    fn garbage_reply_is_rejected() {
        assert!(parse_verdict("I cannot answer that").is_none());
        assert!(parse_verdict("{not json}").is_none());
    }

    #[test]
    fn loose_chart_names_resolve() {
        for (s, expected) in [
            ("bar_chart", ChartType::BarChart),
            ("Line Chart", ChartType::LineChart),
            ("a scatter plot", ChartType::ScatterPlot),
            ("heatmap", ChartType::Heatmap),
        ] {
            assert_eq!(ChartType::from_loose(s), Some(expected), "{s}");
        }
        assert_eq!(ChartType::from_loose("treemap"), None);
    }
}
