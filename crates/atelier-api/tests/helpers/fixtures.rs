#![allow(dead_code)]

use axum_test::multipart::Part;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 80, 40, 255])));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("Failed to encode PNG");
    buffer
}

pub fn png_part(file_name: &str) -> Part {
    Part::bytes(create_test_png(8, 6))
        .file_name(file_name.to_string())
        .mime_type("image/png")
}

/// Declares itself a PNG, carries text
pub fn text_part(file_name: &str) -> Part {
    Part::bytes(b"definitely not an image".to_vec())
        .file_name(file_name.to_string())
        .mime_type("image/png")
}
