//! Response envelopes. Field names here are the wire contract shared with
//! the HTTP wrapper and its clients; every envelope echoes the caller's
//! `session_id` verbatim.

use crate::quality::{DataSummary, QualityVerdict};
use crate::render::RenderResult;
use crate::table::Table;
use serde::Serialize;

/// Column/type metadata attached to clarification and suggestion replies so
/// a client can show the user what they are working with.
#[derive(Debug, Clone, Serialize)]
pub struct DataInfo {
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub data_shape: String,
}

impl DataInfo {
    pub fn from_table(table: &Table) -> Self {
        Self {
            columns: table.column_names(),
            numeric_columns: table.numeric_column_names(),
            categorical_columns: table.categorical_column_names(),
            data_shape: table.shape_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub data_shape: String,
    pub chart_type: String,
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub query_processed: String,
}

/// Soft quality issues carried inside a success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct DataWarnings {
    pub message: String,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success {
        success: bool,
        session_id: String,
        image: String,
        chart_type: String,
        summary: Summary,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data_warnings: Option<DataWarnings>,
    },
    /// Classifier could not act on the query; no `chart_type` is carried,
    /// a placeholder recommendation would only mislead the client.
    Clarification {
        success: bool,
        session_id: String,
        is_chatbot_response: bool,
        message: String,
        suggestions: Vec<String>,
        data_info: DataInfo,
    },
    QualityError {
        success: bool,
        session_id: String,
        is_chatbot_response: bool,
        message: String,
        suggestions: Vec<String>,
        data_quality_issues: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        data_summary: Option<DataSummary>,
        error_type: String,
    },
    Suggestions {
        success: bool,
        session_id: String,
        suggestions: Vec<String>,
        data_info: DataInfo,
    },
    InternalError {
        success: bool,
        session_id: String,
        error: String,
        message: String,
    },
}

impl Envelope {
    pub fn success(
        session_id: &str,
        result: RenderResult,
        table: &Table,
        query: &str,
        warnings: Option<&QualityVerdict>,
    ) -> Self {
        let chart_type = result.chart_type;
        Envelope::Success {
            success: true,
            session_id: session_id.to_string(),
            image: result.image_base64,
            chart_type: chart_type.wire_name().to_string(),
            summary: Summary {
                data_shape: table.shape_string(),
                chart_type: chart_type.wire_name().to_string(),
                columns: table.column_names(),
                numeric_columns: table.numeric_column_names(),
                categorical_columns: table.categorical_column_names(),
                query_processed: query.to_string(),
            },
            message: format!("Successfully created a {} for you!", chart_type.display_name()),
            data_warnings: warnings.filter(|v| v.has_warnings).map(|v| DataWarnings {
                message: v.message.clone(),
                issues: v.issues.clone(),
                suggestions: v.suggestions.clone(),
            }),
        }
    }

    pub fn clarification(
        session_id: &str,
        message: String,
        suggestions: Vec<String>,
        table: &Table,
    ) -> Self {
        Envelope::Clarification {
            success: false,
            session_id: session_id.to_string(),
            is_chatbot_response: true,
            message,
            suggestions,
            data_info: DataInfo::from_table(table),
        }
    }

    pub fn quality_error(session_id: &str, verdict: QualityVerdict) -> Self {
        Envelope::QualityError {
            success: false,
            session_id: session_id.to_string(),
            is_chatbot_response: true,
            message: verdict.message,
            suggestions: verdict.suggestions,
            data_quality_issues: verdict.issues,
            data_summary: verdict.data_summary,
            error_type: "data_quality".to_string(),
        }
    }

    pub fn suggestions(session_id: &str, suggestions: Vec<String>, table: &Table) -> Self {
        Envelope::Suggestions {
            success: true,
            session_id: session_id.to_string(),
            suggestions,
            data_info: DataInfo::from_table(table),
        }
    }

    pub fn internal_error(session_id: &str, error: &str, message: &str) -> Self {
        Envelope::InternalError {
            success: false,
            session_id: session_id.to_string(),
            error: error.to_string(),
            message: message.to_string(),
        }
    }

    /// Only internal errors make the CLI exit non-zero; quality rejections
    /// and clarifications are ordinary outcomes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Envelope::InternalError { .. })
    }

    pub fn chart_type(&self) -> Option<&str> {
        match self {
            Envelope::Success { chart_type, .. } => Some(chart_type),
            _ => None,
        }
    }
}
