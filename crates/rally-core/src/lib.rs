//! Rally Core Library
//!
//! This crate provides the domain models, error types, upload policy and
//! configuration shared by the Rally client crates. It performs no I/O of its
//! own; network access lives in `rally-api-client` and disk access in
//! `rally-storage`.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{ClientConfig, ConfigError, DataMode};
pub use error::{ErrorMetadata, LogLevel, StoreError, UploadError};
pub use hooks::{
    FailureReport, FailureReporter, NoOpFailureReporter, ProfileMediaStore,
    TracingFailureReporter,
};
pub use models::{
    map_kind_to_bucket, LocalFile, MediaReference, MediaUploadResponse, ProfileMedia,
    SignedUploadGrant, UploadKind, UploadOutcome, UploadStage, VerificationResult,
};
pub use validation::{UploadPolicy, ValidatedUpload};
