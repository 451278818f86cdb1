use crate::core::{
    BulkResponse, SubmissionMode, SubmissionOutcome, SubmissionResult, SubmissionStatus,
    ValidatedEntry,
};

const NO_RESULT_REASON: &str = "no result reported by backend";

/// 任一路徑的原始結果，交由 [`reconcile`] 正規化
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    /// 批次端點處理完成（全部或部分）
    Bulk(BulkResponse),
    /// 逐筆送出的結果，依原始順序；`cancelled` 時只包含已完成的項目
    Fallback {
        outcomes: Vec<SubmissionOutcome>,
        cancelled: bool,
    },
    /// 批次呼叫的硬性失敗，不會降級
    BulkFailed { reason: String },
    /// 在批次呼叫前即被取消
    CancelledBeforeSubmit,
}

impl RawOutcome {
    pub fn mode(&self) -> SubmissionMode {
        match self {
            RawOutcome::Fallback { .. } => SubmissionMode::Fallback,
            _ => SubmissionMode::Bulk,
        }
    }
}

pub fn reconcile(entries: &[ValidatedEntry], raw: RawOutcome) -> SubmissionResult {
    let mode = raw.mode();
    match raw {
        RawOutcome::Bulk(response) => from_bulk(entries, response),
        RawOutcome::Fallback {
            outcomes,
            cancelled,
        } => from_outcomes(mode, entries, outcomes, cancelled),
        RawOutcome::BulkFailed { reason } => {
            let outcomes = entries
                .iter()
                .map(|entry| SubmissionOutcome::rejected(entry.line_number, reason.clone()))
                .collect();
            from_outcomes(mode, entries, outcomes, false)
        }
        RawOutcome::CancelledBeforeSubmit => from_outcomes(mode, entries, Vec::new(), true),
    }
}

fn from_outcomes(
    mode: SubmissionMode,
    entries: &[ValidatedEntry],
    outcomes: Vec<SubmissionOutcome>,
    cancelled: bool,
) -> SubmissionResult {
    let not_attempted: Vec<usize> = if cancelled {
        entries
            .iter()
            .map(|entry| entry.line_number)
            .filter(|line| !outcomes.iter().any(|o| o.line_number == *line))
            .collect()
    } else {
        Vec::new()
    };

    let (accepted, failed): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|o| o.accepted);
    let remote_ids: Vec<String> = accepted.iter().filter_map(|o| o.remote_id.clone()).collect();

    let status = if cancelled {
        SubmissionStatus::Partial
    } else {
        SubmissionStatus::from_counts(accepted.len(), failed.len())
    };

    SubmissionResult {
        mode,
        status,
        success_count: accepted.len(),
        fail_count: failed.len(),
        remote_ids,
        failed_entries: failed,
        cancelled,
        not_attempted,
    }
}

/// 批次回應：逐筆結果優先，其次是後端計數，最後才視為全部成功
fn from_bulk(entries: &[ValidatedEntry], response: BulkResponse) -> SubmissionResult {
    if let Some(results) = response.results.filter(|r| !r.is_empty()) {
        let mut outcomes: Vec<Option<SubmissionOutcome>> = vec![None; entries.len()];
        for (position, item) in results.into_iter().enumerate() {
            let index = item.index.unwrap_or(position);
            let Some(entry) = entries.get(index) else {
                tracing::warn!("Ignoring bulk result for unknown index {}", index);
                continue;
            };
            outcomes[index] = Some(if item.success {
                SubmissionOutcome::accepted(entry.line_number, item.order_id)
            } else {
                SubmissionOutcome::rejected(
                    entry.line_number,
                    item.error.unwrap_or_else(|| "rejected by backend".to_string()),
                )
            });
        }

        let outcomes = outcomes
            .into_iter()
            .zip(entries)
            .map(|(outcome, entry)| {
                outcome.unwrap_or_else(|| {
                    SubmissionOutcome::rejected(entry.line_number, NO_RESULT_REASON)
                })
            })
            .collect();
        let mut result = from_outcomes(SubmissionMode::Bulk, entries, outcomes, false);
        if result.remote_ids.is_empty() {
            result.remote_ids = response.order_ids;
        }
        return result;
    }

    let total = entries.len();
    let success_count = match (response.success_count, response.fail_count) {
        (Some(success), _) => success.min(total),
        (None, Some(fail)) => total.saturating_sub(fail),
        (None, None) => total,
    };
    let fail_count = total - success_count;
    if let Some(reported) = response.fail_count {
        if reported != fail_count {
            tracing::warn!(
                "Backend reported {} failures, reconciled to {} for {} entries",
                reported,
                fail_count,
                total
            );
        }
    }

    SubmissionResult {
        mode: SubmissionMode::Bulk,
        status: SubmissionStatus::from_counts(success_count, fail_count),
        success_count,
        fail_count,
        remote_ids: response.order_ids,
        failed_entries: Vec::new(),
        cancelled: false,
        not_attempted: Vec::new(),
    }
}
