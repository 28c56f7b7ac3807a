//! Test images generated with the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Gradient with per-pixel noise so lossy quality settings change the output size
pub fn textured(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let noise = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) % 53;
        Rgb([
            ((x * 255 / width.max(1)) as u8).wrapping_add(noise as u8),
            ((y * 255 / height.max(1)) as u8).wrapping_sub(noise as u8),
            (((x + y) * 5) % 256) as u8,
        ])
    })
}

pub fn jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&textured(width, height))
        .expect("encode jpeg");
    out
}

pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 2 == 0 { 255 } else { 0 };
        Rgba([(x % 256) as u8, (y % 256) as u8, 90, alpha])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

pub fn bmp(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(textured(width, height)), ImageFormat::Bmp)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("encode image");
    out.into_inner()
}

/// Decode a response body and return its dimensions
pub fn dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).expect("decode image");
    (img.width(), img.height())
}

/// Bytes that start like a PNG but are cut off before any image data
pub fn truncated_png() -> Vec<u8> {
    let mut bytes = png_rgba(16, 16);
    bytes.truncate(24);
    bytes
}
