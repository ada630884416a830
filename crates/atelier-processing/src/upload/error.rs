use atelier_core::models::ErrorCategory;
use atelier_core::GENERIC_FAILURE_MESSAGE;
use thiserror::Error;

/// Why a single file was not accepted.
///
/// Every variant except `Storage` and `Internal` is an expected outcome of
/// bad input and carries a message fit for the submitting user.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{name} exceeds the maximum upload size for this site ({limit}).")]
    TooLarge { name: String, limit: String },

    #[error("{name} was only partially uploaded. Please try again.")]
    Incomplete { name: String },

    #[error("{name} is not a supported image type. Please upload a GIF, JPEG or PNG file.")]
    UnsupportedFormat { name: String },

    #[error("{name} could not be read as an image. The file may be damaged.")]
    Unreadable { name: String },

    #[error("Failed to store upload: {0}")]
    Storage(String),

    #[error("Upload processing failed: {0}")]
    Internal(String),
}

impl UploadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UploadError::Storage(_) | UploadError::Internal(_) => ErrorCategory::Unexpected,
            _ => ErrorCategory::Images,
        }
    }

    /// Message shown to the submitting user; internal detail never leaks
    pub fn client_message(&self) -> String {
        match self {
            UploadError::Storage(_) | UploadError::Internal(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}
