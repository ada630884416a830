//! True-type detection and extension correction.

use image::ImageFormat;
use std::fmt;

/// Image formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Gif => "image/gif",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }

    /// Extension written when a filename has to be corrected
    pub fn canonical_extension(&self) -> &'static str {
        match self {
            ImageKind::Gif => "gif",
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }

    /// Every extension that already names this kind correctly
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImageKind::Gif => &["gif"],
            ImageKind::Jpeg => &["jpg", "jpeg", "jpe"],
            ImageKind::Png => &["png"],
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            ImageKind::Gif => ImageFormat::Gif,
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
        }
    }

    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_extension())
    }
}

/// Detect the accepted image kind from the leading bytes, ignoring any
/// client-declared type. `None` when the bytes are not gif, jpeg or png.
pub fn sniff(data: &[u8]) -> Option<ImageKind> {
    image::guess_format(data).ok().and_then(ImageKind::from_format)
}

/// Lower-cased trailing extension segment (`"a.tar.PNG"` gives `"png"`)
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Rename `filename` so its extension matches `kind`.
///
/// Only the trailing segment is replaced, and a name whose extension already
/// fits is returned unchanged, so applying this twice is the same as once.
pub fn correct_extension(filename: &str, kind: ImageKind) -> String {
    match extension_of(filename) {
        Some(ext) if kind.extensions().contains(&ext.as_str()) => filename.to_string(),
        Some(_) => {
            let stem = filename
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(filename);
            format!("{}.{}", stem, kind.canonical_extension())
        }
        None => {
            let stem = filename.trim_end_matches('.');
            let stem = if stem.is_empty() { "image" } else { stem };
            format!("{}.{}", stem, kind.canonical_extension())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::encode;

    #[test]
    fn test_sniff_accepted_formats() {
        assert_eq!(sniff(&encode(ImageFormat::Png, 4, 4)), Some(ImageKind::Png));
        assert_eq!(sniff(&encode(ImageFormat::Jpeg, 4, 4)), Some(ImageKind::Jpeg));
        assert_eq!(sniff(&encode(ImageFormat::Gif, 4, 4)), Some(ImageKind::Gif));
    }

    #[test]
    fn test_sniff_rejects_other_formats() {
        assert_eq!(sniff(&encode(ImageFormat::Bmp, 4, 4)), None);
        assert_eq!(sniff(b"%PDF-1.7 not an image"), None);
        assert_eq!(sniff(b""), None);
    }

    #[test]
    fn test_extension_of_takes_trailing_segment() {
        assert_eq!(extension_of("holiday.photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn test_correct_extension_replaces_only_last_segment() {
        assert_eq!(
            correct_extension("my.great.photo.png", ImageKind::Jpeg),
            "my.great.photo.jpg"
        );
        assert_eq!(correct_extension("scan", ImageKind::Png), "scan.png");
        assert_eq!(correct_extension("photo.jpeg", ImageKind::Jpeg), "photo.jpeg");
    }

    #[test]
    fn test_correct_extension_is_idempotent() {
        for (name, kind) in [
            ("avatar.gif", ImageKind::Png),
            ("x.y.z.webp", ImageKind::Jpeg),
            ("noext", ImageKind::Gif),
            ("trailing.", ImageKind::Png),
        ] {
            let once = correct_extension(name, kind);
            assert_eq!(correct_extension(&once, kind), once);
        }
    }
}
