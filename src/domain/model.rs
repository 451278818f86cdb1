use serde::{Deserialize, Serialize};
use std::fmt;

/// 輸入文字中的一個非空白行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLine {
    pub line_number: usize,
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedEntry {
    pub line_number: usize,
    pub service_id: u64,
    pub target_link: String,
    pub quantity: u64,
}

/// `line_number` 為 `None` 代表整批層級的問題
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub line_number: Option<usize>,
    pub message: String,
}

impl ValidationIssue {
    pub fn for_line(line_number: usize, message: impl Into<String>) -> Self {
        Self {
            line_number: Some(line_number),
            message: message.into(),
        }
    }

    pub fn for_batch(message: impl Into<String>) -> Self {
        Self {
            line_number: None,
            message: message.into(),
        }
    }

    pub fn is_batch_level(&self) -> bool {
        self.line_number.is_none()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "Line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchValidationReport {
    pub valid_entries: Vec<ValidatedEntry>,
    pub issues: Vec<ValidationIssue>,
}

impl BatchValidationReport {
    /// 只有沒有任何問題且至少有一筆有效資料時才可送出
    pub fn is_submittable(&self) -> bool {
        self.issues.is_empty() && !self.valid_entries.is_empty()
    }

    pub fn batch_issue(&self) -> Option<&ValidationIssue> {
        self.issues.iter().find(|issue| issue.is_batch_level())
    }

    pub fn invalid_line_count(&self) -> usize {
        let mut lines: Vec<usize> = self.issues.iter().filter_map(|i| i.line_number).collect();
        lines.dedup();
        lines.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub line_number: usize,
    pub accepted: bool,
    pub remote_id: Option<String>,
    pub reason: Option<String>,
}

impl SubmissionOutcome {
    pub fn accepted(line_number: usize, remote_id: Option<String>) -> Self {
        Self {
            line_number,
            accepted: true,
            remote_id,
            reason: None,
        }
    }

    pub fn rejected(line_number: usize, reason: impl Into<String>) -> Self {
        Self {
            line_number,
            accepted: false,
            remote_id: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    Bulk,
    Fallback,
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionMode::Bulk => write!(f, "bulk"),
            SubmissionMode::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success,
    Partial,
    Failed,
}

impl SubmissionStatus {
    /// 由成功與失敗數量推導狀態；空批次視為成功
    pub fn from_counts(success_count: usize, fail_count: usize) -> Self {
        if fail_count == 0 {
            SubmissionStatus::Success
        } else if success_count == 0 {
            SubmissionStatus::Failed
        } else {
            SubmissionStatus::Partial
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Success => write!(f, "success"),
            SubmissionStatus::Partial => write!(f, "partial"),
            SubmissionStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub mode: SubmissionMode,
    pub status: SubmissionStatus,
    pub success_count: usize,
    pub fail_count: usize,
    pub remote_ids: Vec<String>,
    pub failed_entries: Vec<SubmissionOutcome>,
    /// 被取消時為 true，此時計數只包含已完成的項目
    pub cancelled: bool,
    pub not_attempted: Vec<usize>,
}

impl SubmissionResult {
    pub fn empty() -> Self {
        Self {
            mode: SubmissionMode::Bulk,
            status: SubmissionStatus::Success,
            success_count: 0,
            fail_count: 0,
            remote_ids: Vec::new(),
            failed_entries: Vec::new(),
            cancelled: false,
            not_attempted: Vec::new(),
        }
    }

    pub fn attempted_count(&self) -> usize {
        self.success_count + self.fail_count
    }
}
