//! Command-line entry point. Takes `<file_path> <query> <session_id>`,
//! prints exactly one JSON envelope on stdout, and reserves stderr for
//! diagnostics so callers can pipe stdout straight into a JSON parser.

use chartgen_core::pipeline::{run_pipeline, PipelineConfig};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Generate a chart from a tabular file and a free-text query")]
struct Cli {
    /// CSV or Excel file to chart
    file_path: PathBuf,
    /// Free-text description of the chart, e.g. "bar chart of sales by region"
    query: String,
    /// Opaque identifier echoed back in the response
    session_id: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return;
        }
        Err(_) => {
            // Malformed invocations still emit JSON so callers never have to
            // parse usage text.
            println!(
                "{}",
                serde_json::json!({
                    "error": "Invalid arguments. Expected: file_path query session_id"
                })
            );
            std::process::exit(1);
        }
    };

    let config = PipelineConfig::from_env();
    let envelope = run_pipeline(&config, &cli.file_path, &cli.query, &cli.session_id).await;
    let fatal = envelope.is_fatal();

    match serde_json::to_string(&envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "could not serialize response");
            println!(
                "{}",
                serde_json::json!({ "error": "internal serialization failure" })
            );
            std::process::exit(1);
        }
    }

    if fatal {
        std::process::exit(1);
    }
}
