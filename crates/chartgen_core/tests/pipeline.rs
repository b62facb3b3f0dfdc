//! End-to-end pipeline scenarios over real temp files, remote classifier
//! disabled so everything runs locally.

use chartgen_core::pipeline::{run_pipeline, PipelineConfig};
use std::io::Write;

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

async fn run(file: &tempfile::NamedTempFile, query: &str) -> serde_json::Value {
    let config = PipelineConfig::default();
    let envelope = run_pipeline(&config, file.path(), query, "test-session").await;
    serde_json::to_value(&envelope).unwrap()
}

const SALES_CSV: &str = "region,sales\nA,10\nB,20\nA,15\nC,5\n";

#[tokio::test]
async fn bar_chart_of_sales_by_region_succeeds() {
    let f = write_csv(SALES_CSV);
    let v = run(&f, "bar chart of sales by region").await;
    assert_eq!(v["success"], true, "{v}");
    assert_eq!(v["session_id"], "test-session");
    assert_eq!(v["chart_type"], "bar_chart");
    assert!(!v["image"].as_str().unwrap().is_empty());
    assert_eq!(v["summary"]["chart_type"], "bar_chart");
    assert_eq!(v["summary"]["query_processed"], "bar chart of sales by region");
    assert_eq!(v["summary"]["numeric_columns"][0], "sales");
    assert_eq!(v["summary"]["categorical_columns"][0], "region");
    assert!(v.get("data_warnings").is_none(), "{v}");
}

#[tokio::test]
async fn bar_chart_groups_by_mean() {
    let f = write_csv(SALES_CSV);
    let table = chartgen_core::loader::load_table(f.path()).unwrap();
    let groups = chartgen_core::render::bar_groups(&table).unwrap();
    assert_eq!(
        groups,
        vec![("A".to_string(), 12.5), ("B".to_string(), 20.0), ("C".to_string(), 5.0)]
    );
}

#[tokio::test]
async fn greeting_gets_a_clarification_without_an_image() {
    let f = write_csv(SALES_CSV);
    let v = run(&f, "hi").await;
    assert_eq!(v["success"], false, "{v}");
    assert_eq!(v["is_chatbot_response"], true);
    assert!(v.get("image").is_none());
    assert!(v.get("chart_type").is_none());
    assert!(v["message"].as_str().unwrap().contains("too short"), "{v}");
    assert_eq!(v["data_info"]["data_shape"], "4 rows × 2 columns");
}

#[tokio::test]
async fn mixed_type_column_is_rejected_with_examples() {
    let f = write_csv("price\n10\n20\nabc\n30\nxyz\n");
    let v = run(&f, "histogram of price").await;
    assert_eq!(v["success"], false, "{v}");
    assert_eq!(v["error_type"], "data_quality");
    let issue = v["data_quality_issues"][0].as_str().unwrap();
    assert!(issue.contains("'price'"), "{issue}");
    assert!(issue.contains("'abc', 'xyz'"), "{issue}");
    assert_eq!(v["data_summary"]["total_rows"], 5);
    assert!(!v["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn generate_suggestions_bypasses_rendering() {
    let f = write_csv(SALES_CSV);
    let v = run(&f, "Generate Suggestions").await;
    assert_eq!(v["success"], true, "{v}");
    assert!(v.get("image").is_none());
    let suggestions = v["suggestions"].as_array().unwrap();
    assert!(!suggestions.is_empty());
    assert!(suggestions.len() <= 4);
    assert_eq!(v["data_info"]["columns"][0], "region");
}

#[tokio::test]
async fn single_row_warns_but_still_renders_a_trend() {
    let f = write_csv("sales\n10\n");
    let v = run(&f, "show trend").await;
    assert_eq!(v["success"], true, "{v}");
    assert_eq!(v["chart_type"], "line_chart");
    let warnings = &v["data_warnings"];
    assert!(warnings["issues"]
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i.as_str().unwrap().contains("only 1 row")));
}

#[tokio::test]
async fn heatmap_without_enough_numeric_columns_is_an_internal_error() {
    let f = write_csv(SALES_CSV);
    let v = run(&f, "show a heatmap").await;
    assert_eq!(v["success"], false, "{v}");
    assert_eq!(v["error"], "RenderError");
    assert!(v["message"].as_str().unwrap().contains("2 numeric columns"), "{v}");
}

#[tokio::test]
async fn missing_file_is_an_input_error() {
    let config = PipelineConfig::default();
    let envelope = run_pipeline(
        &config,
        std::path::Path::new("/nonexistent/data.csv"),
        "bar chart",
        "s",
    )
    .await;
    let v = serde_json::to_value(&envelope).unwrap();
    assert_eq!(v["success"], false);
    assert_eq!(v["error"], "InputError");
    assert!(envelope.is_fatal());
}

#[tokio::test]
async fn expired_timeout_reports_a_timeout_error() {
    let f = write_csv(SALES_CSV);
    let config = PipelineConfig {
        remote: None,
        timeout: std::time::Duration::ZERO,
    };
    let envelope = run_pipeline(&config, f.path(), "bar chart of sales", "s").await;
    let v = serde_json::to_value(&envelope).unwrap();
    assert_eq!(v["success"], false, "{v}");
    assert_eq!(v["error"], "Timeout");
    assert!(envelope.is_fatal());
}

#[tokio::test]
async fn identical_inputs_give_identical_responses() {
    let f = write_csv(SALES_CSV);
    let a = run(&f, "pie chart of region").await;
    let b = run(&f, "pie chart of region").await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn correlation_query_resolves_to_scatter() {
    let f = write_csv("x,y\n1,2\n2,4\n3,6\n4,8\n");
    let v = run(&f, "correlation between x and y").await;
    assert_eq!(v["success"], true, "{v}");
    assert_eq!(v["chart_type"], "scatter_plot");
}
