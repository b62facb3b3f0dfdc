//! Core library for chartgen: turn a CSV/Excel file plus a free-text query
//! into a rendered chart (or a structured explanation of why not).
//!
//! The pipeline is loader → quality validator → classifier → renderer →
//! response assembler; see [`pipeline::run_pipeline`] for the entry point
//! the CLI and HTTP wrapper both use.

pub mod classify;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod render;
pub mod response;
pub mod table;

pub use classify::{classify, ChartType, Classification};
pub use pipeline::{run_pipeline, PipelineConfig};
pub use response::Envelope;
pub use table::Table;
