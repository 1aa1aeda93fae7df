//! Tests for the ingest module

use super::*;
use crate::artifact::ArtifactWriter;
use crate::error::Error;
use crate::warehouse::{MemoryWarehouse, Session, SessionContext};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

async fn run(warehouse: &Arc<MemoryWarehouse>, options: IngestOptions) -> crate::Result<RunSummary> {
    let session = Session::open(warehouse.clone(), SessionContext::new())
        .await
        .unwrap();
    let result = Orchestrator::new(options).run(&session).await;
    session.close();
    result
}

fn two_files() -> MemoryWarehouse {
    MemoryWarehouse::new()
        .with_file("my_stage/a.csv", &[])
        .with_file("my_stage/b.csv", &[("ID", "NUMBER"), ("NAME", "TEXT")])
}

#[tokio::test]
async fn test_failed_inference_does_not_block_other_files() {
    let warehouse = Arc::new(two_files());
    let summary = run(&warehouse, IngestOptions::default()).await.unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 1);
    assert!(summary.has_failures());

    let a = summary.outcome("my_stage/a.csv").unwrap();
    match &a.status {
        FileStatus::Failed { stage, reason } => {
            assert_eq!(*stage, FileStage::Listed);
            assert!(reason.contains("no columns"));
        }
        other => panic!("unexpected status: {other:?}"),
    }

    let b = summary.outcome("my_stage/b.csv").unwrap();
    assert!(b.is_success());
    assert_eq!(b.table.as_ref().map(|t| t.as_str()), Some("B"));

    assert_eq!(warehouse.table_names(), vec!["B".to_string()]);
    assert_eq!(
        warehouse.loads(),
        vec![("B".to_string(), "@my_stage/b.csv".to_string())]
    );
}

#[tokio::test]
async fn test_file_name_with_space_loads_from_quoted_source() {
    let warehouse = Arc::new(
        MemoryWarehouse::new().with_file("my_stage/order items.csv", &[("ID", "NUMBER")]),
    );
    let summary = run(&warehouse, IngestOptions::default()).await.unwrap();

    let outcome = summary.outcome("my_stage/order items.csv").unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.table.as_ref().map(|t| t.as_str()), Some("ORDER_ITEMS"));

    let copy = warehouse
        .executed()
        .into_iter()
        .find(|s| s.starts_with("COPY INTO ORDER_ITEMS"))
        .unwrap();
    assert!(copy.contains("\nFROM '@my_stage/order items.csv'\n"));
    assert_eq!(
        warehouse.loads(),
        vec![("ORDER_ITEMS".to_string(), "@my_stage/order items.csv".to_string())]
    );
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/orders.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/customers.csv", &[("ID", "NUMBER"), ("NAME", "TEXT")]),
    );

    let first = run(&warehouse, IngestOptions::default()).await.unwrap();
    let second = run(&warehouse, IngestOptions::default()).await.unwrap();

    assert_eq!(first.succeeded(), 2);
    assert_eq!(second.succeeded(), 2);
    assert!(!second.has_failures());
    assert_eq!(
        warehouse.table_names(),
        vec!["CUSTOMERS".to_string(), "ORDERS".to_string()]
    );
    assert_eq!(warehouse.loads().len(), 4);
}

#[tokio::test]
async fn test_same_table_is_serialized() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/2024/orders.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/2025/orders.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/c.csv", &[("X", "TEXT")])
            .with_latency(Duration::from_millis(20)),
    );

    let summary = run(&warehouse, IngestOptions::default().with_concurrency(4))
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 3);
    let paths: Vec<&str> = summary.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "my_stage/2024/orders.csv",
            "my_stage/2025/orders.csv",
            "my_stage/c.csv"
        ]
    );

    // Each file's create and load run back to back for the shared table
    let orders: Vec<String> = warehouse
        .executed()
        .into_iter()
        .filter(|s| s.contains("ORDERS"))
        .map(|s| s.split_whitespace().next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(orders, vec!["CREATE", "COPY", "CREATE", "COPY"]);

    let loads = warehouse.loads();
    let order_sources: Vec<&str> = loads
        .iter()
        .filter(|(table, _)| table == "ORDERS")
        .map(|(_, source)| source.as_str())
        .collect();
    assert_eq!(order_sources.len(), 2);
    assert!(order_sources.contains(&"@my_stage/2024/orders.csv"));
    assert!(order_sources.contains(&"@my_stage/2025/orders.csv"));
}

#[tokio::test]
async fn test_table_locks_exclude_same_table_only() {
    let locks = TableLocks::new();
    let orders = crate::naming::TableName::sanitize("orders").unwrap();
    let customers = crate::naming::TableName::sanitize("customers").unwrap();

    let held = locks.acquire(&orders).await;
    // A different table is not blocked
    let _other = locks.acquire(&customers).await;

    let blocked = tokio::time::timeout(Duration::from_millis(20), locks.acquire(&orders)).await;
    assert!(blocked.is_err());

    drop(held);
    let reacquired = tokio::time::timeout(Duration::from_millis(200), locks.acquire(&orders)).await;
    assert!(reacquired.is_ok());
}

#[tokio::test]
async fn test_file_timeout_marks_file_failed() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/slow.csv", &[("ID", "NUMBER")])
            .with_latency(Duration::from_millis(500)),
    );

    let options = IngestOptions::default().with_file_timeout(Duration::from_millis(50));
    let summary = run(&warehouse, options).await.unwrap();

    let outcome = summary.outcome("my_stage/slow.csv").unwrap();
    match &outcome.status {
        FileStatus::Failed { stage, reason } => {
            assert_eq!(*stage, FileStage::LoadCommandGenerated);
            assert!(reason.contains("timed out after 50ms"), "{reason}");
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(warehouse.table_names().is_empty());
}

#[tokio::test]
async fn test_connectivity_loss_aborts_run() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/a.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/b.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/c.csv", &[("ID", "NUMBER")])
            .disconnecting_on("COPY INTO B"),
    );

    let err = run(&warehouse, IngestOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Connectivity { .. }));
    assert!(!warehouse.table_names().contains(&"C".to_string()));
}

#[tokio::test]
async fn test_rejected_ddl_fails_only_that_file() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/bad.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/good.csv", &[("ID", "NUMBER")])
            .failing_statements_containing("CREATE TABLE IF NOT EXISTS BAD"),
    );

    let summary = run(&warehouse, IngestOptions::default()).await.unwrap();

    let bad = summary.outcome("my_stage/bad.csv").unwrap();
    match &bad.status {
        FileStatus::Failed { stage, reason } => {
            assert_eq!(*stage, FileStage::LoadCommandGenerated);
            assert!(reason.contains("injected failure"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(summary.outcome("my_stage/good.csv").unwrap().is_success());
}

#[tokio::test]
async fn test_rejected_load_reports_table_created_stage() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/orders.csv", &[("ID", "NUMBER")])
            .failing_statements_containing("COPY INTO ORDERS"),
    );

    let summary = run(&warehouse, IngestOptions::default()).await.unwrap();
    let outcome = summary.outcome("my_stage/orders.csv").unwrap();
    assert!(matches!(
        outcome.status,
        FileStatus::Failed {
            stage: FileStage::TableCreated,
            ..
        }
    ));
    assert_eq!(warehouse.table_names(), vec!["ORDERS".to_string()]);
}

#[tokio::test]
async fn test_invalid_table_name_fails_before_inference() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/select.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/.hidden", &[("ID", "NUMBER")]),
    );

    let summary = run(&warehouse, IngestOptions::default()).await.unwrap();
    assert_eq!(summary.failed(), 2);

    let reserved = summary.outcome("my_stage/select.csv").unwrap();
    assert!(reserved.table.is_none());
    assert!(reserved.failure_reason().unwrap().contains("reserved word"));
    assert!(warehouse.executed().is_empty());
}

#[tokio::test]
async fn test_dry_run_generates_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = Arc::new(two_files());

    let options = IngestOptions::default()
        .with_dry_run(true)
        .with_artifacts(ArtifactWriter::new(dir.path()));
    let summary = run(&warehouse, options).await.unwrap();

    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.failed(), 1);
    assert!(warehouse.table_names().is_empty());
    assert!(warehouse.executed().is_empty());

    let artifact = std::fs::read_to_string(dir.path().join("B.sql")).unwrap();
    assert!(artifact.contains("CREATE TABLE IF NOT EXISTS B"));
    assert!(artifact.contains("COPY INTO B"));
    assert!(!dir.path().join("A.sql").exists());
}

#[tokio::test]
async fn test_pattern_filters_listing() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/orders.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/readme.txt", &[("LINE", "TEXT")]),
    );

    let options = IngestOptions::default().with_pattern(Regex::new(r"\.csv$").unwrap());
    let summary = run(&warehouse, options).await.unwrap();

    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.files[0].path, "my_stage/orders.csv");
    assert!(summary.outcome("my_stage/readme.txt").is_none());
}

#[tokio::test]
async fn test_stage_root_limits_listing() {
    let warehouse = Arc::new(
        MemoryWarehouse::new()
            .with_file("my_stage/2024/orders.csv", &[("ID", "NUMBER")])
            .with_file("my_stage/2025/orders.csv", &[("ID", "NUMBER")]),
    );

    let options = IngestOptions::default().with_stage_root("@my_stage/2024");
    let summary = run(&warehouse, options).await.unwrap();

    assert_eq!(summary.files.len(), 1);
    assert_eq!(
        warehouse.loads(),
        vec![("ORDERS".to_string(), "@my_stage/2024/orders.csv".to_string())]
    );
}

#[tokio::test]
async fn test_artifact_failure_is_only_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("artifacts");
    std::fs::write(&blocker, "not a directory").unwrap();

    let warehouse = Arc::new(
        MemoryWarehouse::new().with_file("my_stage/orders.csv", &[("ID", "NUMBER")]),
    );
    let options = IngestOptions::default().with_artifacts(ArtifactWriter::new(&blocker));
    let summary = run(&warehouse, options).await.unwrap();

    let outcome = summary.outcome("my_stage/orders.csv").unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.artifact.is_none());
    assert_eq!(warehouse.table_names(), vec!["ORDERS".to_string()]);
}

#[tokio::test]
async fn test_summary_serializes_to_json() {
    let warehouse = Arc::new(two_files());
    let summary = run(&warehouse, IngestOptions::default()).await.unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert!(json["elapsed_ms"].is_u64());
    assert_eq!(json["files"][0]["path"], "my_stage/a.csv");
    assert_eq!(json["files"][0]["status"], "failed");
    assert_eq!(json["files"][0]["stage"], "listed");
    assert_eq!(json["files"][1]["status"], "succeeded");
    assert_eq!(json["files"][1]["table"], "B");
}

#[test]
fn test_file_stage_order() {
    assert!(FileStage::Listed < FileStage::SchemaInferred);
    assert!(FileStage::DdlGenerated < FileStage::LoadCommandGenerated);
    assert!(FileStage::LoadCommandGenerated < FileStage::TableCreated);
    assert!(FileStage::Loaded < FileStage::Done);
    assert_eq!(FileStage::LoadCommandGenerated.to_string(), "load_command_generated");
}

#[test]
fn test_options_from_config() {
    let yaml = r#"
connection:
  account: xy12345
  user: LOADER
  auth:
    type: oauth
    token: t
stage:
  root: "@raw"
  pattern: '\.csv$'
ingest:
  concurrency: 3
  file_timeout_secs: 30
  write_artifacts: false
"#;
    let config = crate::config::IngestConfig::from_yaml_with(
        yaml,
        &crate::template::TemplateContext::new(),
    )
    .unwrap();
    let options = IngestOptions::from_config(&config).unwrap();

    assert_eq!(options.stage_root, "@raw");
    assert_eq!(options.concurrency, 3);
    assert_eq!(options.file_timeout, Some(Duration::from_secs(30)));
    assert!(options.pattern.is_some());
    assert!(options.artifacts.is_none());
    assert!(!options.dry_run);
}
