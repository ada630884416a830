//! Atelier Core Library
//!
//! Domain models, content schemas, field sanitizers, error types and
//! configuration shared by every crate of the submission pipeline.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, UploadLimits};
pub use error::{
    AppError, ErrorMetadata, LogLevel, GENERIC_FAILURE_MESSAGE, NOT_AUTHORIZED_MESSAGE,
};
