use crate::core::parser::FIELD_DELIMITER;
use crate::core::{BatchValidationReport, CandidateLine, ValidatedEntry, ValidationIssue};
use url::Url;

pub const DEFAULT_MAX_ENTRIES: usize = 100;

pub const MSG_PARTS: &str = "must have exactly 3 parts";
pub const MSG_SERVICE_ID: &str = "service id must be a number";
pub const MSG_URL: &str = "invalid URL format";
pub const MSG_QUANTITY: &str = "quantity must be a positive number";

/// 語意驗證。純函式，相同輸入永遠得到相同報告。
#[derive(Debug, Clone, Copy)]
pub struct EntryValidator {
    max_entries: usize,
}

impl Default for EntryValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl EntryValidator {
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn validate(&self, lines: &[CandidateLine]) -> BatchValidationReport {
        if lines.len() > self.max_entries {
            tracing::debug!(
                "Batch of {} lines exceeds ceiling of {}",
                lines.len(),
                self.max_entries
            );
            return BatchValidationReport {
                valid_entries: Vec::new(),
                issues: vec![ValidationIssue::for_batch(format!(
                    "maximum {} orders allowed",
                    self.max_entries
                ))],
            };
        }

        let mut report = BatchValidationReport::default();
        for line in lines {
            match validate_line(line) {
                Ok(entry) => report.valid_entries.push(entry),
                Err(issue) => report.issues.push(issue),
            }
        }

        tracing::debug!(
            "Validated {} lines: {} valid, {} issues",
            lines.len(),
            report.valid_entries.len(),
            report.issues.len()
        );
        report
    }
}

/// 依序套用規則，第一個失敗的規則即為該行的錯誤
fn validate_line(line: &CandidateLine) -> Result<ValidatedEntry, ValidationIssue> {
    let fail = |message: &str| ValidationIssue::for_line(line.line_number, message);

    let parts: Vec<&str> = line.raw_text.split(FIELD_DELIMITER).map(str::trim).collect();
    let [id, link, quantity] = parts.as_slice() else {
        return Err(fail(MSG_PARTS));
    };

    let service_id = id.parse::<u64>().map_err(|_| fail(MSG_SERVICE_ID))?;

    Url::parse(link).map_err(|_| fail(MSG_URL))?;

    let quantity = quantity
        .parse::<u64>()
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| fail(MSG_QUANTITY))?;

    Ok(ValidatedEntry {
        line_number: line.line_number,
        service_id,
        target_link: link.to_string(),
        quantity,
    })
}
