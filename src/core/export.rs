use crate::core::{Storage, SubmissionResult, ValidatedEntry};
use crate::utils::error::{BulkError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const RECORD_FILENAME: &str = "submission_record.zip";
const COUNTS_ONLY_REASON: &str = "backend reported counts only";

#[derive(Debug, Serialize)]
struct OutcomeRow<'a> {
    line_number: usize,
    service_id: u64,
    link: &'a str,
    quantity: u64,
    status: &'static str,
    reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RecordSummary<'a> {
    submitted_at: DateTime<Utc>,
    total_entries: usize,
    #[serde(flatten)]
    result: &'a SubmissionResult,
}

/// 每一行的送出狀態，依原始行號排列
pub fn outcomes_csv(entries: &[ValidatedEntry], result: &SubmissionResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    // 後端只回報數量時，無法得知哪些行失敗
    let counts_only = result.failed_entries.len() < result.fail_count;

    for entry in entries {
        let failure = result
            .failed_entries
            .iter()
            .find(|o| o.line_number == entry.line_number);
        let (status, reason) = if result.not_attempted.contains(&entry.line_number) {
            ("not_attempted", None)
        } else if let Some(outcome) = failure {
            ("failed", outcome.reason.as_deref())
        } else if counts_only {
            ("unknown", Some(COUNTS_ONLY_REASON))
        } else {
            ("accepted", None)
        };

        writer.serialize(OutcomeRow {
            line_number: entry.line_number,
            service_id: entry.service_id,
            link: &entry.target_link,
            quantity: entry.quantity,
            status,
            reason,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| BulkError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| BulkError::IoError(std::io::Error::other(e)))
}

pub fn summary_json(
    entries: &[ValidatedEntry],
    result: &SubmissionResult,
    submitted_at: DateTime<Utc>,
) -> Result<String> {
    let summary = RecordSummary {
        submitted_at,
        total_entries: entries.len(),
        result,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

/// 將摘要與逐行結果打包成 ZIP，寫入儲存空間後回傳位置
pub async fn write_record<S: Storage>(
    storage: &S,
    entries: &[ValidatedEntry],
    result: &SubmissionResult,
) -> Result<String> {
    let csv_output = outcomes_csv(entries, result)?;
    let json_output = summary_json(entries, result, Utc::now())?;

    let zip_data = {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
        zip.write_all(json_output.as_bytes())?;

        zip.start_file::<_, ()>("outcomes.csv", FileOptions::default())?;
        zip.write_all(csv_output.as_bytes())?;

        let cursor = zip.finish()?;
        cursor.into_inner()
    };

    tracing::debug!("Writing submission record ({} bytes)", zip_data.len());
    storage.write_file(RECORD_FILENAME, &zip_data).await?;

    let location = storage.location(RECORD_FILENAME);
    tracing::info!("📁 Submission record saved to: {}", location);
    Ok(location)
}
