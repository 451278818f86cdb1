pub mod export;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod reconciler;
pub mod validator;

pub use crate::domain::model::{
    BatchValidationReport, CandidateLine, SubmissionMode, SubmissionOutcome, SubmissionResult,
    SubmissionStatus, ValidatedEntry, ValidationIssue,
};
pub use crate::domain::ports::{
    BulkItemResult, BulkResponse, ConfigProvider, Storage, Transport, TransportError,
};
pub use crate::utils::error::Result;
