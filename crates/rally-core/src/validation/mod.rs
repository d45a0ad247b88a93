//! Validation modules

pub mod upload;

pub use upload::{normalize_content_type, UploadPolicy, ValidatedUpload};
