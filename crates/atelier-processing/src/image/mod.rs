//! Image inspection and normalization

pub mod format;
pub mod orientation;

pub use format::{correct_extension, extension_of, sniff, ImageKind};
pub use orientation::{normalize_jpeg_orientation, read_exif_orientation, ImageOrientation};
