//! Raster backend traits and shared types.
//!
//! The core transforms never touch pixels directly. They ask an
//! [`ImageBackend`] to decode bytes and to hand out fresh drawing surfaces,
//! and they talk to each surface through the [`RasterCanvas`] capability:
//! draw a region, clip to a rounded rectangle, export as encoded bytes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on top of the
//! `image` crate. Tests use the recording `MockBackend` below.

use super::params::{EncodeOptions, Placement, Rect};
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Canvas unavailable: {0}")]
    CanvasUnavailable(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
    #[error("Region outside the source image: {0}")]
    RegionOutOfBounds(String),
    #[error("Invalid fit target: {0}")]
    InvalidTarget(String),
}

/// A decoded, immutable RGBA bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// A 2D drawing surface owned by exactly one transform invocation.
pub trait RasterCanvas {
    /// Canvas size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Draw `region` of `source` scaled into `placement`. Anything that lands
    /// outside the canvas (or outside an active clip) is discarded.
    fn draw_region(
        &mut self,
        source: &RasterImage,
        region: Rect,
        placement: Placement,
    ) -> Result<(), BackendError>;

    /// Restrict subsequent draws to the canvas rectangle with rounded corners.
    fn clip_to_rounded_rect(&mut self, radius: u32);

    /// Composite the current contents over an opaque `background` colour.
    /// Every pixel is fully opaque afterwards.
    fn flatten(&mut self, background: [u8; 3]);

    /// Encode the current canvas contents.
    fn export(&self, options: EncodeOptions) -> Result<Vec<u8>, BackendError>;
}

/// Source of decoded images and fresh canvases.
///
/// `Sync` so a single backend can serve rayon workers slicing in parallel;
/// every worker gets its own canvas.
pub trait ImageBackend: Sync {
    type Canvas: RasterCanvas;

    /// Decode an encoded raster (PNG, JPEG, WebP, ...) into a bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError>;

    /// Acquire a transparent `width × height` canvas.
    fn canvas(&self, width: u32, height: u32) -> Result<Self::Canvas, BackendError>;
}
