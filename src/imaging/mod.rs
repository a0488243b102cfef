//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Grid slice** | exact region copy per cell |
//! | **Cover fit** | Lanczos3 scale + centred draw, clipped by the canvas |
//! | **Encode** | PNG / JPEG / WebP (lossless) / AVIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for grid and cover geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] + [`RasterCanvas`] traits and [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, RasterCanvas, RasterImage};
pub use calculations::{
    CoverPlacement, cell_index, cell_rect, cell_size, corner_radius_px, cover_placement,
};
pub use operations::{cover_fit, fit_encoded, slice_composite, slice_grid};
pub use params::{
    EncodeOptions, GridSpec, OutputFormat, Placement, Quality, Rect, SliceOptions,
};
pub use rust_backend::RustBackend;
