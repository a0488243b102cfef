//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which regions to draw where) and the
//! [`backend`](super::backend) (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`]: Encoded raster format of every pipeline output.
//! - [`EncodeOptions`]: Format + quality pair handed to `export`.
//! - [`GridSpec`]: Logical partition of a composite image (columns × rows).
//! - [`Rect`] / [`Placement`]: Source regions and (possibly off-canvas) destinations.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Encoded raster format for slices, banner and logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    /// Lossless only; the `image` crate has no lossy WebP encoder.
    #[serde(rename = "webp")]
    WebP,
    Avif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

/// How a canvas is turned back into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub format: OutputFormat,
    pub quality: Quality,
}

impl EncodeOptions {
    pub fn png() -> Self {
        Self::default()
    }
}

/// Logical partition of a composite image into `columns × rows` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
}

impl GridSpec {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of output cells.
    pub fn cell_count(self) -> u32 {
        self.columns * self.rows
    }
}

impl Default for GridSpec {
    /// The sticker sheet layout: 6 across, 4 down.
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 4,
        }
    }
}

/// Axis-aligned region in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Destination of a draw on a canvas. Offsets may be negative and the size
/// may exceed the canvas; whatever falls outside is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Per-slice presentation options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SliceOptions {
    /// Rounded-corner radius as a fraction of the shorter cell side. `0.0`
    /// leaves the rectangular content untouched.
    pub corner_radius: f32,
    pub encode: EncodeOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn default_grid_is_six_by_four() {
        let grid = GridSpec::default();
        assert_eq!((grid.columns, grid.rows), (6, 4));
        assert_eq!(grid.cell_count(), 24);
    }

    #[test]
    fn format_deserializes_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: OutputFormat,
        }
        let w: Wrapper = toml::from_str(r#"format = "webp""#).unwrap();
        assert_eq!(w.format, OutputFormat::WebP);
        let w: Wrapper = toml::from_str(r#"format = "jpeg""#).unwrap();
        assert_eq!(w.format, OutputFormat::Jpeg);
        assert_eq!(w.format.extension(), "jpg");
    }
}
