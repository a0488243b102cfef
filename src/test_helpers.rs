//! Shared test utilities for the meme-pack test suite.
//!
//! Builds synthetic images in memory so tests never depend on fixture files:
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let composite = encode_png(&gradient_image(3840, 2160));
//! let slices = slice_composite(&RustBackend::new(), &composite, GridSpec::default(), &options)?;
//! ```

use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};

/// Opaque image where every pixel encodes its own coordinates.
///
/// Red/green carry `x`/`y` modulo 256, blue carries the 256-block index, so
/// any pixel-level mix-up between regions shows up as a mismatch.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x / 256 + y / 256 * 16) % 256) as u8,
            255,
        ])
    })
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

/// Decode PNG (or any supported) bytes back to RGBA.
pub fn decode_rgba(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes).unwrap().into_rgba8()
}
