pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{HttpTransport, LocalStorage};
pub use config::{toml_config::TomlConfig, SubmissionConfig};
pub use core::pipeline::{run_bulk_pipeline, validate_batch, BulkPipeline, PipelineOutcome};
pub use utils::error::{BulkError, Result};
