use crate::domain::model::ValidatedEntry;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// 寫入檔案在儲存空間中的完整位置
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn max_entries(&self) -> usize;
    fn inter_item_delay(&self) -> Duration;
    fn bulk_timeout(&self) -> Duration;
    fn item_timeout(&self) -> Duration;
    fn cache_bulk_unavailable(&self) -> bool;
}

/// 傳輸層錯誤。只有 `CapabilityAbsent` 會觸發逐筆送出的降級模式。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("bulk endpoint not available (HTTP {status})")]
    CapabilityAbsent { status: u16 },

    #[error("unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("rejected by backend: {message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response (HTTP {status}): {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn is_capability_absent(&self) -> bool {
        matches!(self, TransportError::CapabilityAbsent { .. })
    }
}

/// 後端對單筆項目回報的結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    /// 在請求陣列中的位置 (0 起算)；缺少時以回應中的順序對應
    #[serde(default)]
    pub index: Option<usize>,
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 批次端點回應的內容，所有欄位皆為可選
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
    #[serde(default)]
    pub success_count: Option<usize>,
    #[serde(default)]
    pub fail_count: Option<usize>,
    #[serde(default)]
    pub order_ids: Vec<String>,
    #[serde(default)]
    pub results: Option<Vec<BulkItemResult>>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit_bulk(
        &self,
        entries: &[ValidatedEntry],
    ) -> std::result::Result<BulkResponse, TransportError>;

    /// 成功時回傳後端指派的訂單編號
    async fn submit_single(
        &self,
        entry: &ValidatedEntry,
    ) -> std::result::Result<String, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn submit_bulk(
        &self,
        entries: &[ValidatedEntry],
    ) -> std::result::Result<BulkResponse, TransportError> {
        (**self).submit_bulk(entries).await
    }

    async fn submit_single(
        &self,
        entry: &ValidatedEntry,
    ) -> std::result::Result<String, TransportError> {
        (**self).submit_single(entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_capability_absent_triggers_fallback() {
        assert!(TransportError::CapabilityAbsent { status: 405 }.is_capability_absent());
        assert!(!TransportError::Unauthorized { status: 401 }.is_capability_absent());
        assert!(!TransportError::Timeout.is_capability_absent());
        assert!(!TransportError::Network("reset".into()).is_capability_absent());
    }

    #[test]
    fn test_bulk_response_accepts_camel_case_envelope() {
        let response: BulkResponse = serde_json::from_value(serde_json::json!({
            "successCount": 2,
            "failCount": 1,
            "orderIds": ["a", "b"],
            "results": [
                {"index": 0, "success": true, "orderId": "a"},
                {"index": 2, "success": false, "error": "link unreachable"}
            ]
        }))
        .unwrap();

        assert_eq!(response.success_count, Some(2));
        assert_eq!(response.order_ids, vec!["a", "b"]);
        let results = response.results.unwrap();
        assert_eq!(results[1].error.as_deref(), Some("link unreachable"));
    }
}
