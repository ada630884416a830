//! Atelier Processing Library
//!
//! Upload intake for submitted images: size ceilings, true-type sniffing,
//! extension correction, decodability checks, collision-free naming, JPEG
//! orientation normalization, and the [`UploadEngine`] that ties them together.

pub mod image;
pub mod limits;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use self::image::{ImageKind, ImageOrientation};
pub use limits::SizeCeiling;
pub use upload::{
    candidate_name, Clock, GalleryOutcome, TransportError, UploadEngine, UploadError, UploadFile,
    ValidatedImage,
};
