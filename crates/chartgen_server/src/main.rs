//! HTTP wrapper around the chartgen CLI. Accepts a multipart upload, writes
//! it to the upload directory, runs one CLI invocation per request, and
//! relays the CLI's JSON verbatim. The upload is deleted after the run
//! regardless of outcome.

use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Outer bound on one CLI run; matches the pipeline's own timeout.
const RUN_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_PORT: u16 = 8000;

fn upload_dir() -> PathBuf {
    std::env::var("CHARTGEN_UPLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./uploads"))
}

/// The CLI to run per request: `CHARTGEN_BIN` if set, otherwise the
/// `chartgen-cli` binary next to this server's executable.
fn cli_binary() -> PathBuf {
    if let Ok(bin) = std::env::var("CHARTGEN_BIN") {
        return PathBuf::from(bin);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("chartgen-cli")))
        .unwrap_or_else(|| PathBuf::from("chartgen-cli"))
}

/// Strip any path components a client smuggles into the filename.
fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .unwrap_or_else(|| "upload.csv".to_string())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "chartgen" }))
}

/// Environment diagnostics: upload dir writability and CLI availability.
async fn diagnostics() -> Json<Value> {
    let dir = upload_dir();
    let dir_writable = tokio::fs::create_dir_all(&dir).await.is_ok();
    let bin = cli_binary();
    let bin_exists = bin.exists() || std::env::var("CHARTGEN_BIN").is_err();
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "upload_dir": dir.to_string_lossy(),
        "upload_dir_writable": dir_writable,
        "cli_binary": bin.to_string_lossy(),
        "cli_binary_found": bin_exists,
        "remote_classifier_configured": std::env::var("CHARTGEN_OLLAMA_URL").is_ok(),
    }))
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
}

fn server_error(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": message })),
    )
}

async fn generate_graph(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename = String::from("upload.csv");
    let mut query: Option<String> = None;
    let mut session_id = String::from("default-session");

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed multipart body");
                return bad_request("Malformed multipart body");
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if let Some(n) = field.file_name() {
                    filename = sanitize_filename(n);
                }
                match field.bytes().await {
                    Ok(b) => file_bytes = Some(b.to_vec()),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read upload");
                        return bad_request("Could not read uploaded file");
                    }
                }
            }
            "query" => query = field.text().await.ok(),
            "session_id" => {
                if let Ok(s) = field.text().await {
                    if !s.trim().is_empty() {
                        session_id = s;
                    }
                }
            }
            _ => {}
        }
    }

    let Some(file_bytes) = file_bytes else {
        return bad_request("Missing 'file' field");
    };
    let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
        return bad_request("Missing 'query' field");
    };

    let dir = upload_dir();
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        tracing::error!(error = %e, "could not create upload directory");
        return server_error("Upload directory is not writable");
    }
    let saved_path = dir.join(format!("{session_id}_{filename}"));
    if let Err(e) = tokio::fs::write(&saved_path, &file_bytes).await {
        tracing::error!(error = %e, path = %saved_path.display(), "could not save upload");
        return server_error("Could not save uploaded file");
    }

    tracing::info!(path = %saved_path.display(), %session_id, "running pipeline");
    let response = run_cli(&cli_binary(), RUN_TIMEOUT, &saved_path, &query, &session_id).await;

    if let Err(e) = tokio::fs::remove_file(&saved_path).await {
        tracing::warn!(error = %e, path = %saved_path.display(), "could not delete upload");
    }

    response
}

async fn run_cli(
    bin: &Path,
    timeout: Duration,
    file: &Path,
    query: &str,
    session_id: &str,
) -> (StatusCode, Json<Value>) {
    // kill_on_drop so a timed-out generator does not linger as a detached
    // process when the output future is dropped
    let output = tokio::time::timeout(
        timeout,
        tokio::process::Command::new(bin)
            .arg(file)
            .arg(query)
            .arg(session_id)
            .kill_on_drop(true)
            .output(),
    )
    .await;

    let output = match output {
        Ok(Ok(o)) => o,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "could not start graph generator");
            return server_error("Could not start the graph generator");
        }
        Err(_) => {
            tracing::error!("graph generation timed out");
            return server_error("Graph generation timed out");
        }
    };

    match serde_json::from_slice::<Value>(&output.stdout) {
        Ok(body) => {
            let status = if output.status.success() {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(body))
        }
        Err(e) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(error = %e, %stderr, "graph generator produced invalid output");
            server_error("Graph generator produced invalid output")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/generate-graph", post(generate_graph))
        .route("/health", get(health))
        .route("/test", get(diagnostics))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    tracing::info!(%addr, "chartgen_server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
