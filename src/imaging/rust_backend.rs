//! Pure Rust raster backend. Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image::load_from_memory` |
//! | Region copy | `image::imageops::crop_imm` |
//! | Scaled draw (visible window only) | `image::imageops::resize` with `Lanczos3` filter |
//! | Flatten onto background | per-pixel source-over |
//! | Encode → PNG / JPEG / WebP | `image::codecs::{png, jpeg, webp}` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, ImageBackend, RasterCanvas, RasterImage};
use super::calculations::inside_rounded_rect;
use super::params::{EncodeOptions, OutputFormat, Placement, Rect};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

/// Largest canvas side we are willing to allocate, matching common browser limits.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory RGBA drawing surface.
#[derive(Debug)]
pub struct PixelCanvas {
    pixels: RgbaImage,
    clip_radius: Option<u32>,
}

impl PixelCanvas {
    /// Borrow the current pixels (mainly for tests and previews).
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// One axis of a scaled draw, restricted to what the canvas can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    src_start: u32,
    src_len: u32,
    /// Offset of the resampled span within the placement.
    dst_start: u32,
    dst_len: u32,
}

/// Source pixels needed to paint placement pixels `[lo, hi)` when `src`
/// pixels are stretched over `placed`. The returned destination span always
/// covers `[lo, hi)`.
fn visible_span(lo: u32, hi: u32, src: u32, placed: u32) -> Span {
    let (lo, hi, src, placed) = (lo as u64, hi as u64, src as u64, placed as u64);
    let src_start = (lo * src / placed).min(src - 1);
    let src_end = (hi * src).div_ceil(placed).clamp(src_start + 1, src);
    let src_len = src_end - src_start;
    Span {
        src_start: src_start as u32,
        src_len: src_len as u32,
        dst_start: ((2 * src_start * placed + src) / (2 * src)) as u32,
        dst_len: (src_len * placed).div_ceil(src) as u32,
    }
}

impl ImageBackend for RustBackend {
    type Canvas = PixelCanvas;

    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(BackendError::Decode("image has no pixels".into()));
        }
        Ok(RasterImage::from_rgba(decoded.into_rgba8()))
    }

    fn canvas(&self, width: u32, height: u32) -> Result<PixelCanvas, BackendError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(BackendError::CanvasUnavailable(format!(
                "cannot allocate a {}x{} surface",
                width, height
            )));
        }
        Ok(PixelCanvas {
            pixels: RgbaImage::new(width, height),
            clip_radius: None,
        })
    }
}

impl RasterCanvas for PixelCanvas {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn draw_region(
        &mut self,
        source: &RasterImage,
        region: Rect,
        placement: Placement,
    ) -> Result<(), BackendError> {
        let (src_w, src_h) = source.dimensions();
        if region.width == 0
            || region.height == 0
            || region.x as u64 + region.width as u64 > src_w as u64
            || region.y as u64 + region.height as u64 > src_h as u64
        {
            return Err(BackendError::RegionOutOfBounds(format!(
                "region {}x{}+{}+{} is outside the {}x{} source",
                region.width, region.height, region.x, region.y, src_w, src_h
            )));
        }
        if placement.width == 0 || placement.height == 0 {
            return Ok(());
        }

        let (canvas_w, canvas_h) = self.pixels.dimensions();
        // Visible window of the placement, in placement coordinates.
        let x0 = (-placement.x).clamp(0, placement.width as i64) as u32;
        let y0 = (-placement.y).clamp(0, placement.height as i64) as u32;
        let x1 = (canvas_w as i64 - placement.x).clamp(0, placement.width as i64) as u32;
        let y1 = (canvas_h as i64 - placement.y).clamp(0, placement.height as i64) as u32;
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        // Only the source pixels behind the window are resampled.
        let cols = visible_span(x0, x1, region.width, placement.width);
        let rows = visible_span(y0, y1, region.height, placement.height);
        if cols.dst_len as u64 * rows.dst_len as u64 > (MAX_CANVAS_SIDE as u64).pow(2) {
            return Err(BackendError::CanvasUnavailable(format!(
                "scaled window of {}x{} exceeds the surface limit",
                cols.dst_len, rows.dst_len
            )));
        }

        let cropped = image::imageops::crop_imm(
            source.pixels(),
            region.x + cols.src_start,
            region.y + rows.src_start,
            cols.src_len,
            rows.src_len,
        )
        .to_image();
        // Same size means an exact pixel copy, no resampling.
        let drawn = if (cols.src_len, rows.src_len) == (cols.dst_len, rows.dst_len) {
            cropped
        } else {
            image::imageops::resize(&cropped, cols.dst_len, rows.dst_len, FilterType::Lanczos3)
        };

        let radius = self.clip_radius;
        for (dx, dy, pixel) in drawn.enumerate_pixels() {
            let px = cols.dst_start + dx;
            let py = rows.dst_start + dy;
            if px < x0 || px >= x1 || py < y0 || py >= y1 {
                continue;
            }
            let cx = (placement.x + px as i64) as u32;
            let cy = (placement.y + py as i64) as u32;
            if let Some(r) = radius {
                if !inside_rounded_rect(cx, cy, canvas_w, canvas_h, r) {
                    continue;
                }
            }
            self.pixels.put_pixel(cx, cy, *pixel);
        }
        Ok(())
    }

    fn clip_to_rounded_rect(&mut self, radius: u32) {
        self.clip_radius = Some(radius);
    }

    fn flatten(&mut self, background: [u8; 3]) {
        for pixel in self.pixels.pixels_mut() {
            let alpha = pixel[3] as u32;
            for (channel, bg) in pixel.0.iter_mut().zip(background) {
                let blended = *channel as u32 * alpha + bg as u32 * (255 - alpha);
                *channel = ((blended + 127) / 255) as u8;
            }
            pixel[3] = 255;
        }
    }

    fn export(&self, options: EncodeOptions) -> Result<Vec<u8>, BackendError> {
        let (width, height) = self.pixels.dimensions();
        let quality = options.quality.value() as u8;
        let mut bytes = Vec::new();

        let result = match options.format {
            OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut bytes).write_image(
                self.pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).into_rgb8();
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality)
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
            OutputFormat::WebP => image::codecs::webp::WebPEncoder::new_lossless(&mut bytes)
                .write_image(
                    self.pixels.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                ),
            OutputFormat::Avif => {
                image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut bytes, 6, quality)
                    .write_image(
                        self.pixels.as_raw(),
                        width,
                        height,
                        ExtendedColorType::Rgba8,
                    )
            }
        };

        result.map_err(|e| {
            BackendError::Encode(format!(
                "{} encode failed: {}",
                options.format.extension(),
                e
            ))
        })?;
        Ok(bytes)
    }
}
