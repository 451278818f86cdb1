use crate::config::SubmissionConfig;
use crate::core::ConfigProvider;
use crate::utils::error::{BulkError, Result};
use crate::utils::validation::{
    validate_endpoint_path, validate_path, validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_bulk_path")]
    pub bulk_path: String,
    #[serde(default = "default_single_path")]
    pub single_path: String,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub record_dir: String,
}

fn default_bulk_path() -> String {
    "/orders/mass".to_string()
}

fn default_single_path() -> String {
    "/orders".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            bulk_path: default_bulk_path(),
            single_path: default_single_path(),
            headers: None,
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// 取得完整端點網址
    pub fn endpoint(&self, path: &str) -> Result<String> {
        let base = validate_required_field("backend.base_url", &self.base_url)?;
        Ok(format!("{}{}", base.trim_end_matches('/'), path))
    }

    pub fn bulk_endpoint(&self) -> Result<String> {
        self.endpoint(&self.bulk_path)
    }

    pub fn single_endpoint(&self) -> Result<String> {
        self.endpoint(&self.single_path)
    }
}

impl Validate for BackendConfig {
    fn validate(&self) -> Result<()> {
        let base_url = validate_required_field("backend.base_url", &self.base_url)?;
        validate_url("backend.base_url", base_url)?;
        validate_endpoint_path("backend.bulk_path", &self.bulk_path)?;
        validate_endpoint_path("backend.single_path", &self.single_path)?;

        if let Some(headers) = &self.headers {
            for (name, value) in headers {
                if value.contains("${") {
                    return Err(BulkError::ConfigError {
                        message: format!(
                            "Header '{}' references an undefined environment variable",
                            name
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BulkError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${PANEL_TOKEN})；未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
        });

        re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn record_dir(&self) -> Option<&str> {
        self.export.as_ref().map(|e| e.record_dir.as_str())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.backend.validate()?;
        self.submission.validate()?;
        if let Some(export) = &self.export {
            validate_path("export.record_dir", &export.record_dir)?;
        }
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn max_entries(&self) -> usize {
        self.submission.max_entries()
    }

    fn inter_item_delay(&self) -> Duration {
        self.submission.inter_item_delay()
    }

    fn bulk_timeout(&self) -> Duration {
        self.submission.bulk_timeout()
    }

    fn item_timeout(&self) -> Duration {
        self.submission.item_timeout()
    }

    fn cache_bulk_unavailable(&self) -> bool {
        self.submission.cache_bulk_unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "https://panel.example.com/api/"
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.submission, SubmissionConfig::default());
        assert_eq!(
            config.backend.bulk_endpoint().unwrap(),
            "https://panel.example.com/api/orders/mass"
        );
        assert_eq!(
            config.backend.single_endpoint().unwrap(),
            "https://panel.example.com/api/orders"
        );
        assert!(config.record_dir().is_none());
    }

    #[test]
    fn test_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "http://localhost:8080"
bulk_path = "/v2/orders/bulk"
single_path = "/v2/orders"

[backend.headers]
X-Api-Key = "secret"

[submission]
max_entries = 50
inter_item_delay_ms = 0
bulk_timeout_ms = 30000
item_timeout_ms = 5000
cache_bulk_unavailable = true

[export]
record_dir = "./records"
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.max_entries(), 50);
        assert!(config.inter_item_delay().is_zero());
        assert_eq!(config.item_timeout(), Duration::from_secs(5));
        assert!(config.cache_bulk_unavailable());
        assert_eq!(config.record_dir(), Some("./records"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BULK_ORDER_TEST_TOKEN", "tok-123");
        let config = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "https://panel.example.com"
[backend.headers]
Authorization = "Bearer ${BULK_ORDER_TEST_TOKEN}"
"#,
        )
        .unwrap();

        let headers = config.backend.headers.as_ref().unwrap();
        assert_eq!(headers["Authorization"], "Bearer tok-123");
    }

    #[test]
    fn test_undefined_env_var_fails_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "https://panel.example.com"
[backend.headers]
Authorization = "Bearer ${BULK_ORDER_SURELY_UNDEFINED_VAR}"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(BulkError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_missing_base_url() {
        let config = TomlConfig::from_toml_str("[backend]\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(BulkError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            TomlConfig::from_toml_str("[backend\nbase_url = 1"),
            Err(BulkError::TomlError(_))
        ));
    }
}
