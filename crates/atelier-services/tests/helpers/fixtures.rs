use atelier_services::UploadFile;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 255])));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png");
    buffer
}

pub fn png_file(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", png_bytes(4, 3))
}

/// Looks like a PNG to a sniffer, fails to decode
pub fn broken_png_file(name: &str) -> UploadFile {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    UploadFile::new(name, "image/png", data)
}
