//! End-to-end pipeline: load, validate, classify, render, assemble.
//!
//! Every outcome is an [`Envelope`]; callers never see raw errors. The
//! quality validator and classifier short-circuit with their own envelopes,
//! and anything unexpected becomes an internal-error envelope.

use crate::classify::{classify, suggest_charts, Classification};
use crate::llm::RemoteClassifier;
use crate::loader::load_table;
use crate::quality::validate;
use crate::render::render_chart;
use crate::response::Envelope;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Outer bound on one request. Generous; it exists to stop pathological
/// inputs, not to police normal latency.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// The query that bypasses classification and rendering and returns only
/// column-aware suggestions.
const SUGGESTIONS_QUERY: &str = "generate suggestions";

const SUGGESTIONS_CAP: usize = 4;

pub struct PipelineConfig {
    pub remote: Option<RemoteClassifier>,
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { remote: None, timeout: DEFAULT_TIMEOUT }
    }
}

impl PipelineConfig {
    /// Remote classification is enabled only when `CHARTGEN_OLLAMA_URL` is
    /// set; everything else runs fully local.
    pub fn from_env() -> Self {
        Self { remote: RemoteClassifier::from_env(), ..Self::default() }
    }
}

#[tracing::instrument(skip_all, fields(session_id = %session_id, query = %query))]
pub async fn run_pipeline(
    config: &PipelineConfig,
    file: &Path,
    query: &str,
    session_id: &str,
) -> Envelope {
    match tokio::time::timeout(config.timeout, run_stages(config, file, query, session_id)).await
    {
        Ok(envelope) => envelope,
        Err(_) => {
            warn!("pipeline timed out");
            Envelope::internal_error(
                session_id,
                "Timeout",
                "The request took too long to process. Please try a smaller file or a simpler query.",
            )
        }
    }
}

async fn run_stages(
    config: &PipelineConfig,
    file: &Path,
    query: &str,
    session_id: &str,
) -> Envelope {
    // Loading and rendering run on the blocking pool: they never yield on
    // their own, and the outer timeout can only fire at an await point.
    let path = file.to_path_buf();
    let table = match tokio::task::spawn_blocking(move || load_table(&path)).await {
        Ok(Ok(t)) => t,
        Ok(Err(e)) => {
            warn!(error = %e, "failed to load input file");
            return Envelope::internal_error(session_id, "InputError", &e.to_string());
        }
        Err(e) => {
            warn!(error = %e, "loader task failed");
            return Envelope::internal_error(session_id, "InputError", "failed to read the input file");
        }
    };

    let verdict = validate(&table);
    if !verdict.is_valid {
        info!("quality validation rejected the table");
        return Envelope::quality_error(session_id, verdict);
    }

    if query.trim().eq_ignore_ascii_case(SUGGESTIONS_QUERY) {
        return Envelope::suggestions(session_id, suggest_charts(&table, SUGGESTIONS_CAP), &table);
    }

    let classification = match &config.remote {
        Some(remote) => match remote.classify(query, &table).await {
            Some(c) => c,
            None => classify(query, &table),
        },
        None => classify(query, &table),
    };

    match classification {
        Classification::Clarify { message, suggestions } => {
            info!("query needs clarification");
            Envelope::clarification(session_id, message, suggestions, &table)
        }
        Classification::Actionable { chart_type } => {
            info!(chart_type = chart_type.wire_name(), "rendering chart");
            let render_table = table.clone();
            let render_query = query.to_string();
            let rendered = tokio::task::spawn_blocking(move || {
                render_chart(&render_table, chart_type, &render_query)
            })
            .await;
            match rendered {
                Ok(Ok(result)) => {
                    Envelope::success(session_id, result, &table, query, Some(&verdict))
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "rendering failed");
                    Envelope::internal_error(session_id, "RenderError", &e.to_string())
                }
                Err(e) => {
                    warn!(error = %e, "render task failed");
                    Envelope::internal_error(session_id, "RenderError", "rendering failed")
                }
            }
        }
    }
}
