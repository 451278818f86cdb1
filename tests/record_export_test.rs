use anyhow::Result;
use bulk_order::core::export::{write_record, RECORD_FILENAME};
use bulk_order::core::{SubmissionMode, SubmissionStatus};
use bulk_order::utils::validation::Validate;
use bulk_order::{BulkPipeline, HttpTransport, LocalStorage, PipelineOutcome, TomlConfig};
use httpmock::prelude::*;
use std::io::Read;
use tempfile::TempDir;

async fn create_test_config(temp_dir: &str, base_url: &str) -> String {
    // 將Windows路徑中的反斜杠轉為正斜杠以避免TOML解析問題
    let normalized_path = temp_dir.replace('\\', "/");
    let config_content = format!(
        r#"
[backend]
base_url = "{}"
bulk_path = "/orders/mass"
single_path = "/orders"

[submission]
max_entries = 10
inter_item_delay_ms = 0
bulk_timeout_ms = 2000
item_timeout_ms = 2000

[export]
record_dir = "{}/records"
"#,
        base_url, normalized_path
    );

    let config_path = format!("{}/bulk-order.toml", temp_dir);
    tokio::fs::write(&config_path, config_content)
        .await
        .expect("Failed to write test config");

    config_path
}

#[tokio::test]
async fn test_fallback_run_writes_submission_record() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_dir.path().to_str().unwrap();

    let server = MockServer::start();
    let bulk_mock = server.mock(|when, then| {
        when.method(POST).path("/orders/mass");
        then.status(405);
    });
    let ok_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/orders")
            .body_contains("https://example.com/ok");
        then.status(200).json_body(serde_json::json!({"order": 9001}));
    });
    let bad_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/orders")
            .body_contains("https://example.com/bad");
        then.status(422)
            .json_body(serde_json::json!({"error": "Quantity below minimum"}));
    });

    let config_path = create_test_config(temp_path, &server.base_url()).await;
    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;

    let transport = HttpTransport::new(&config.backend, &config)?;
    let pipeline = BulkPipeline::new(transport, &config);

    let outcome = pipeline
        .run("5 | https://example.com/ok | 100\n\n6 | https://example.com/bad | 1")
        .await?;
    let PipelineOutcome::Submitted { entries, result } = outcome else {
        panic!("expected the batch to be submitted");
    };

    bulk_mock.assert_hits(1);
    ok_mock.assert_hits(1);
    bad_mock.assert_hits(1);
    assert_eq!(result.mode, SubmissionMode::Fallback);
    assert_eq!(result.status, SubmissionStatus::Partial);
    assert_eq!(result.failed_entries[0].line_number, 3);

    let storage = LocalStorage::new(config.record_dir().unwrap().to_string());
    let location = write_record(&storage, &entries, &result).await?;
    assert!(location.ends_with(RECORD_FILENAME));

    let zip_data = std::fs::read(&location)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;

    let mut csv_content = String::new();
    archive
        .by_name("outcomes.csv")?
        .read_to_string(&mut csv_content)?;
    assert!(csv_content.contains("5,https://example.com/ok,100,accepted,"));
    assert!(csv_content.contains("6,https://example.com/bad,1,failed,Quantity below minimum"));

    let mut summary = String::new();
    archive
        .by_name("summary.json")?
        .read_to_string(&mut summary)?;
    let summary: serde_json::Value = serde_json::from_str(&summary)?;
    assert_eq!(summary["mode"], "fallback");
    assert_eq!(summary["success_count"], 1);
    assert_eq!(summary["total_entries"], 2);

    Ok(())
}

#[tokio::test]
async fn test_batch_over_configured_ceiling_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_dir.path().to_str().unwrap();

    let server = MockServer::start();
    let any_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let config_path = create_test_config(temp_path, &server.base_url()).await;
    let config = TomlConfig::from_file(&config_path)?;
    let pipeline = BulkPipeline::new(HttpTransport::new(&config.backend, &config)?, &config);

    let text: String = (1..=11)
        .map(|i| format!("{} | https://example.com/{} | 1\n", i, i))
        .collect();
    let outcome = pipeline.run(&text).await?;

    any_mock.assert_hits(0);
    let report = outcome.report().expect("batch should be rejected");
    assert!(report.valid_entries.is_empty());
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].message, "maximum 10 orders allowed");

    Ok(())
}
