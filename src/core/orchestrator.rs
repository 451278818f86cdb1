use crate::core::reconciler::{reconcile, RawOutcome};
use crate::core::{
    ConfigProvider, SubmissionOutcome, SubmissionResult, Transport, ValidatedEntry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 送出流程的狀態
#[derive(Debug)]
enum Stage {
    BulkAttempt,
    FallbackSequential,
    Reconciling(RawOutcome),
}

/// 先嘗試一次批次呼叫，批次端點不存在時降級為逐筆送出
pub struct SubmissionOrchestrator<T: Transport> {
    transport: T,
    inter_item_delay: Duration,
    cache_bulk_unavailable: bool,
    bulk_unavailable: AtomicBool,
}

impl<T: Transport> SubmissionOrchestrator<T> {
    pub fn new<C: ConfigProvider>(transport: T, config: &C) -> Self {
        Self {
            transport,
            inter_item_delay: config.inter_item_delay(),
            cache_bulk_unavailable: config.cache_bulk_unavailable(),
            bulk_unavailable: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn submit(&self, entries: &[ValidatedEntry]) -> SubmissionResult {
        self.submit_with_cancellation(entries, &CancellationToken::new())
            .await
    }

    pub async fn submit_with_cancellation(
        &self,
        entries: &[ValidatedEntry],
        cancel: &CancellationToken,
    ) -> SubmissionResult {
        if entries.is_empty() {
            tracing::debug!("Nothing to submit, skipping transport");
            return SubmissionResult::empty();
        }

        let mut stage = if self.cache_bulk_unavailable && self.bulk_unavailable.load(Ordering::Relaxed)
        {
            tracing::info!("⏭️ Bulk endpoint known to be unavailable, submitting sequentially");
            Stage::FallbackSequential
        } else {
            Stage::BulkAttempt
        };

        loop {
            tracing::debug!("Submission stage: {:?}", stage);
            stage = match stage {
                Stage::BulkAttempt => self.attempt_bulk(entries, cancel).await,
                Stage::FallbackSequential => {
                    Stage::Reconciling(self.submit_sequentially(entries, cancel).await)
                }
                Stage::Reconciling(raw) => {
                    let result = reconcile(entries, raw);
                    tracing::info!(
                        "✅ Submission finished: mode={}, status={}, success={}, failed={}",
                        result.mode,
                        result.status,
                        result.success_count,
                        result.fail_count
                    );
                    return result;
                }
            };
        }
    }

    async fn attempt_bulk(&self, entries: &[ValidatedEntry], cancel: &CancellationToken) -> Stage {
        if cancel.is_cancelled() {
            tracing::warn!("🛑 Submission cancelled before bulk call");
            return Stage::Reconciling(RawOutcome::CancelledBeforeSubmit);
        }

        tracing::info!("📦 Submitting {} entries to bulk endpoint", entries.len());
        match self.transport.submit_bulk(entries).await {
            Ok(response) => Stage::Reconciling(RawOutcome::Bulk(response)),
            Err(e) if e.is_capability_absent() => {
                tracing::warn!("⚠️ {}, falling back to sequential submission", e);
                if self.cache_bulk_unavailable {
                    self.bulk_unavailable.store(true, Ordering::Relaxed);
                }
                Stage::FallbackSequential
            }
            Err(e) => {
                tracing::error!("❌ Bulk submission failed: {}", e);
                Stage::Reconciling(RawOutcome::BulkFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn submit_sequentially(
        &self,
        entries: &[ValidatedEntry],
        cancel: &CancellationToken,
    ) -> RawOutcome {
        let mut outcomes = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    "🛑 Submission cancelled after {} of {} entries",
                    outcomes.len(),
                    entries.len()
                );
                return RawOutcome::Fallback {
                    outcomes,
                    cancelled: true,
                };
            }

            let outcome = match self.transport.submit_single(entry).await {
                Ok(remote_id) => {
                    tracing::debug!("Line {} accepted as order {}", entry.line_number, remote_id);
                    SubmissionOutcome::accepted(entry.line_number, Some(remote_id))
                }
                Err(e) => {
                    tracing::warn!("Line {} failed: {}", entry.line_number, e);
                    SubmissionOutcome::rejected(entry.line_number, e.to_string())
                }
            };
            outcomes.push(outcome);

            let is_last = index + 1 == entries.len();
            if !is_last && !self.inter_item_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.inter_item_delay) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        RawOutcome::Fallback {
            outcomes,
            cancelled: false,
        }
    }
}
