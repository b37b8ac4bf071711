//! Encoded test images generated on the fly

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    // Checkerboard with per-pixel variation so encoders keep a realistic size
    let image = RgbImage::from_fn(width, height, |x, y| {
        let tile = if (x / 4 + y / 4) % 2 == 0 { 200 } else { 40 };
        let shade = u8::try_from((x * 7 + y * 13) % 50).unwrap_or(0);
        Rgb([tile + shade, tile, 255 - tile - shade])
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode test image");
    bytes
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}
