#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MAX_ENTRIES_LIMIT: usize = 10_000;

/// 送出流程可調整的參數
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub max_entries: usize,
    /// 逐筆送出時每次呼叫之間的間隔，0 表示不等待
    pub inter_item_delay_ms: u64,
    pub bulk_timeout_ms: u64,
    pub item_timeout_ms: u64,
    /// 記住批次端點不存在，同一個 orchestrator 之後不再嘗試
    pub cache_bulk_unavailable: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            inter_item_delay_ms: 100,
            bulk_timeout_ms: 60_000,
            item_timeout_ms: 15_000,
            cache_bulk_unavailable: false,
        }
    }
}

impl Validate for SubmissionConfig {
    fn validate(&self) -> Result<()> {
        validate_range("submission.max_entries", self.max_entries, 1, MAX_ENTRIES_LIMIT)?;
        validate_positive_number("submission.bulk_timeout_ms", self.bulk_timeout_ms, 1)?;
        validate_positive_number("submission.item_timeout_ms", self.item_timeout_ms, 1)?;
        Ok(())
    }
}

impl ConfigProvider for SubmissionConfig {
    fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }

    fn bulk_timeout(&self) -> Duration {
        Duration::from_millis(self.bulk_timeout_ms)
    }

    fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }

    fn cache_bulk_unavailable(&self) -> bool {
        self.cache_bulk_unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SubmissionConfig::default();
        assert_eq!(config.max_entries(), 100);
        assert_eq!(config.inter_item_delay(), Duration::from_millis(100));
        assert!(config.bulk_timeout() > config.item_timeout());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_entries = SubmissionConfig {
            max_entries: 0,
            ..SubmissionConfig::default()
        };
        assert!(zero_entries.validate().is_err());

        let zero_timeout = SubmissionConfig {
            item_timeout_ms: 0,
            ..SubmissionConfig::default()
        };
        assert!(zero_timeout.validate().is_err());
    }
}
