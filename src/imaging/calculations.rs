//! Pure calculation functions for grid and cover-fit geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Rounding policy
//!
//! Cells are `floor(width / columns) × floor(height / rows)`. Leftover pixels
//! at the right and bottom edges of the composite are dropped, never absorbed
//! into the last column or row, so every cell has identical dimensions and no
//! two cells share a pixel.

use super::params::{GridSpec, Placement, Rect};

/// Size of one grid cell under the floor policy.
///
/// # Examples
/// ```
/// # use meme_pack::imaging::{GridSpec, cell_size};
/// assert_eq!(cell_size((3840, 2160), GridSpec::new(6, 4)), (640, 540));
/// // 1001 px across 6 columns → 166 px cells, 5 px dropped
/// assert_eq!(cell_size((1001, 400), GridSpec::new(6, 4)), (166, 100));
/// ```
pub fn cell_size(composite: (u32, u32), grid: GridSpec) -> (u32, u32) {
    (composite.0 / grid.columns, composite.1 / grid.rows)
}

/// 1-based, row-major index of the cell at `(row, col)`.
pub fn cell_index(grid: GridSpec, row: u32, col: u32) -> u32 {
    row * grid.columns + col + 1
}

/// Source region of the cell with the given 1-based row-major index.
pub fn cell_rect(grid: GridSpec, cell: (u32, u32), index: u32) -> Rect {
    let zero_based = index - 1;
    let row = zero_based / grid.columns;
    let col = zero_based % grid.columns;
    Rect::new(col * cell.0, row * cell.1, cell.0, cell.1)
}

/// Where a cover-fitted source lands on the target canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverPlacement {
    /// `max(target_w / source_w, target_h / source_h)`.
    pub scale: f64,
    pub placement: Placement,
}

/// Calculate the cover fit of `source` onto a `target` canvas.
///
/// The scaled size is rounded to whole pixels but never drops below the
/// target, and the offsets are `-(scaled - target) / 2` (floored), so the
/// placement always spans the full canvas in both directions.
///
/// # Examples
/// ```
/// # use meme_pack::imaging::cover_placement;
/// let fit = cover_placement((1000, 1000), (750, 400));
/// assert_eq!(fit.scale, 0.75);
/// assert_eq!((fit.placement.width, fit.placement.height), (750, 750));
/// assert_eq!((fit.placement.x, fit.placement.y), (0, -175));
/// ```
pub fn cover_placement(source: (u32, u32), target: (u32, u32)) -> CoverPlacement {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let scale = f64::max(
        tgt_w as f64 / src_w as f64,
        tgt_h as f64 / src_h as f64,
    );

    let width = ((src_w as f64 * scale).round() as u32).max(tgt_w);
    let height = ((src_h as f64 * scale).round() as u32).max(tgt_h);

    CoverPlacement {
        scale,
        placement: Placement {
            x: -(((width - tgt_w) / 2) as i64),
            y: -(((height - tgt_h) / 2) as i64),
            width,
            height,
        },
    }
}

/// Rounded-corner radius in pixels for a cell, from a fraction of its shorter side.
pub fn corner_radius_px(cell: (u32, u32), fraction: f32) -> u32 {
    (cell.0.min(cell.1) as f32 * fraction).round() as u32
}

/// Whether pixel `(x, y)` lies inside a `width × height` rectangle whose
/// corners are rounded with `radius`. Tested at the pixel centre.
pub fn inside_rounded_rect(x: u32, y: u32, width: u32, height: u32, radius: u32) -> bool {
    if x >= width || y >= height {
        return false;
    }
    let r = radius.min(width / 2).min(height / 2) as f64;
    if r == 0.0 {
        return true;
    }
    let px = x as f64 + 0.5;
    let py = y as f64 + 0.5;
    let cx = px.clamp(r, width as f64 - r);
    let cy = py.clamp(r, height as f64 - r);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= r * r
}
