use crate::core::orchestrator::SubmissionOrchestrator;
use crate::core::parser::parse;
use crate::core::validator::EntryValidator;
use crate::core::{
    BatchValidationReport, ConfigProvider, SubmissionResult, Transport, ValidatedEntry,
};
use crate::utils::error::{BulkError, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// 一次送出動作的結果：驗證未通過時只有報告，否則為最終送出結果
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    NotSubmitted(BatchValidationReport),
    Submitted {
        entries: Vec<ValidatedEntry>,
        result: SubmissionResult,
    },
}

impl PipelineOutcome {
    pub fn result(&self) -> Option<&SubmissionResult> {
        match self {
            PipelineOutcome::Submitted { result, .. } => Some(result),
            PipelineOutcome::NotSubmitted(_) => None,
        }
    }

    pub fn report(&self) -> Option<&BatchValidationReport> {
        match self {
            PipelineOutcome::NotSubmitted(report) => Some(report),
            PipelineOutcome::Submitted { .. } => None,
        }
    }
}

/// 文字 → 解析 → 驗證 → 送出 → 整合結果
pub struct BulkPipeline<T: Transport> {
    validator: EntryValidator,
    orchestrator: SubmissionOrchestrator<T>,
    in_flight: Mutex<()>,
}

impl<T: Transport> BulkPipeline<T> {
    pub fn new<C: ConfigProvider>(transport: T, config: &C) -> Self {
        Self {
            validator: EntryValidator::new(config.max_entries()),
            orchestrator: SubmissionOrchestrator::new(transport, config),
            in_flight: Mutex::new(()),
        }
    }

    pub fn orchestrator(&self) -> &SubmissionOrchestrator<T> {
        &self.orchestrator
    }

    /// 純驗證，不會接觸後端
    pub fn validate(&self, raw_text: &str) -> BatchValidationReport {
        self.validator.validate(&parse(raw_text))
    }

    pub async fn run(&self, raw_text: &str) -> Result<PipelineOutcome> {
        self.run_with_cancellation(raw_text, &CancellationToken::new())
            .await
    }

    pub async fn run_with_cancellation(
        &self,
        raw_text: &str,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome> {
        let report = self.validate(raw_text);
        if !report.is_submittable() {
            tracing::info!(
                "📋 Batch not submitted: {} valid entries, {} issues",
                report.valid_entries.len(),
                report.issues.len()
            );
            return Ok(PipelineOutcome::NotSubmitted(report));
        }

        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| BulkError::SubmissionInProgress)?;

        let entries = report.valid_entries;
        let result = self
            .orchestrator
            .submit_with_cancellation(&entries, cancel)
            .await;

        Ok(PipelineOutcome::Submitted { entries, result })
    }
}

/// 只解析與驗證，不需要後端設定
pub fn validate_batch<C: ConfigProvider>(config: &C, raw_text: &str) -> BatchValidationReport {
    EntryValidator::new(config.max_entries()).validate(&parse(raw_text))
}

/// 單次執行的便利函式
pub async fn run_bulk_pipeline<T: Transport, C: ConfigProvider>(
    transport: T,
    config: &C,
    raw_text: &str,
) -> Result<PipelineOutcome> {
    BulkPipeline::new(transport, config).run(raw_text).await
}
