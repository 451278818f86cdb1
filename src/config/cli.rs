use crate::config::toml_config::{BackendConfig, ExportConfig, TomlConfig};
use crate::config::SubmissionConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "bulk-order")]
#[command(about = "Validate and submit a batch of service orders")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Batch file with one `service_id | link | quantity` per line; stdin when omitted or "-"
    #[arg(short, long)]
    pub input: Option<String>,

    /// Override backend.base_url from the config file
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override submission.inter_item_delay_ms
    #[arg(long)]
    pub inter_item_delay_ms: Option<u64>,

    /// Write a submission record archive into this directory
    #[arg(long)]
    pub record_dir: Option<String>,

    /// Validate only, never contact the backend
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliArgs {
    /// 載入配置檔並套用命令列覆蓋設定
    pub fn resolve_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(Path::new(path))?,
            None => TomlConfig {
                backend: BackendConfig::default(),
                submission: SubmissionConfig::default(),
                export: None,
            },
        };

        if let Some(base_url) = &self.base_url {
            config.backend.base_url = Some(base_url.clone());
        }
        if let Some(delay) = self.inter_item_delay_ms {
            config.submission.inter_item_delay_ms = delay;
        }
        if let Some(record_dir) = &self.record_dir {
            config.export = Some(ExportConfig {
                record_dir: record_dir.clone(),
            });
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_without_config_file() {
        let args = CliArgs::parse_from([
            "bulk-order",
            "--base-url",
            "https://panel.example.com",
            "--inter-item-delay-ms",
            "0",
            "--record-dir",
            "out",
        ]);
        let config = args.resolve_config().unwrap();

        assert_eq!(
            config.backend.base_url.as_deref(),
            Some("https://panel.example.com")
        );
        assert_eq!(config.submission.inter_item_delay_ms, 0);
        assert_eq!(config.record_dir(), Some("out"));
    }

    #[test]
    fn test_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulk-order.toml");
        std::fs::write(
            &path,
            "[backend]\nbase_url = \"https://from-file.example.com\"\n[submission]\nmax_entries = 10\n",
        )
        .unwrap();

        let args = CliArgs::parse_from([
            "bulk-order",
            "--config",
            path.to_str().unwrap(),
            "--base-url",
            "https://from-flag.example.com",
        ]);
        let config = args.resolve_config().unwrap();

        assert_eq!(
            config.backend.base_url.as_deref(),
            Some("https://from-flag.example.com")
        );
        assert_eq!(config.submission.max_entries, 10);
    }
}
