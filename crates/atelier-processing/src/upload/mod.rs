//! Upload intake: validate → name → normalize → store → register.

pub mod engine;
pub mod error;
pub mod filename;
pub mod types;

pub use engine::{Clock, GalleryOutcome, UploadEngine};
pub use error::UploadError;
pub use filename::{candidate_name, fallback_name};
pub use types::{TransportError, UploadFile, ValidatedImage};
