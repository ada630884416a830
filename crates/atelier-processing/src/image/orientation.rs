use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Image orientation operations
pub struct ImageOrientation;

impl ImageOrientation {
    /// Clockwise rotation needed to display an image with the given EXIF
    /// orientation upright. Mirrored orientations are left alone.
    pub fn rotation_for(orientation: u32) -> Option<u16> {
        match orientation {
            3 => Some(180),
            6 => Some(90),
            8 => Some(270),
            _ => None,
        }
    }

    /// Rotate image by specified angle (90, 180, or 270 degrees clockwise)
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img,
        }
    }
}

/// Read the EXIF orientation tag (1-8), if the data carries one
pub fn read_exif_orientation(data: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(data);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// Rotate a JPEG upright according to its EXIF orientation.
///
/// Returns the re-encoded bytes (maximum quality, orientation metadata gone
/// with the rest of the EXIF block) and the new dimensions, or `Ok(None)` when
/// no rotation is needed. CPU-bound; call from a blocking context.
pub fn normalize_jpeg_orientation(
    data: &[u8],
) -> Result<Option<(Vec<u8>, (u32, u32))>, image::ImageError> {
    let Some(angle) = read_exif_orientation(data).and_then(ImageOrientation::rotation_for) else {
        return Ok(None);
    };

    let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
    let rotated = ImageOrientation::rotate_by_angle(decoded, angle);
    let dimensions = rotated.dimensions();

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, 100);
    DynamicImage::ImageRgb8(rotated.to_rgb8()).write_with_encoder(encoder)?;

    tracing::debug!(
        angle = angle,
        width = dimensions.0,
        height = dimensions.1,
        "Normalized JPEG orientation"
    );

    Ok(Some((buffer, dimensions)))
}
