//! Synthetic images for unit tests.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::decode::{DecodedImage, PixelLayout};
use crate::encode::encode_jpeg;

/// Smooth RGB gradient; compresses well.
pub fn gradient(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(128);
        }
    }
    DecodedImage::new(width, height, PixelLayout::Rgb8, pixels)
}

/// Deterministic RGB noise; compresses badly, so size tracks quality.
pub fn noise(width: u32, height: u32, seed: u32) -> DecodedImage {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    let len = width as usize * height as usize * 3;
    let pixels = (0..len)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    DecodedImage::new(width, height, PixelLayout::Rgb8, pixels)
}

/// PNG encoding of `image`, keeping its layout.
pub fn png_bytes(image: &DecodedImage) -> Vec<u8> {
    let color = match image.layout {
        PixelLayout::Rgb8 => ExtendedColorType::Rgb8,
        PixelLayout::Rgba8 => ExtendedColorType::Rgba8,
    };
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(&image.pixels, image.width, image.height, color)
        .unwrap();
    out
}

/// JPEG encoding of `image` at quality 90.
pub fn jpeg_bytes(image: &DecodedImage) -> Vec<u8> {
    let rgb = image.clone().into_rgb();
    encode_jpeg(&rgb.pixels, rgb.width, rgb.height, 90).unwrap()
}

/// PNG with a half-transparent alpha channel.
pub fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = (0..width as usize * height as usize)
        .flat_map(|i| [200, (i % 256) as u8, 40, 128])
        .collect();
    png_bytes(&DecodedImage::new(width, height, PixelLayout::Rgba8, pixels))
}
