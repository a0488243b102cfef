//! High-level image operations: grid slicing and cover fitting.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute regions and placements, and drive a canvas per
//! output asset. Nothing is shared between invocations: every slice and every
//! fitted asset gets its own canvas and its own byte buffer.

use super::backend::{BackendError, ImageBackend, RasterCanvas, RasterImage};
use super::calculations::{cell_rect, cell_size, corner_radius_px, cover_placement};
use super::params::{EncodeOptions, GridSpec, Placement, Rect, SliceOptions};
use crate::naming::{fitted_file_name, slice_file_name};
use crate::types::{FittedAsset, FittedKind, ImageSlice};
use log::debug;
use rayon::prelude::*;

/// Colour behind transparent source pixels in cover-fitted output.
pub const COVER_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Split a composite into `grid.columns × grid.rows` equally sized slices.
///
/// Slices come back in row-major order with 1-based indices. Cells are
/// `floor(width / columns) × floor(height / rows)`; leftover edge pixels are
/// dropped. Each slice is an exact copy of its source region, optionally with
/// rounded corners masked out when `options.corner_radius > 0`.
///
/// Cells are rendered in parallel; any failure fails the whole call.
pub fn slice_grid(
    backend: &impl ImageBackend,
    composite: &RasterImage,
    grid: GridSpec,
    options: &SliceOptions,
) -> Result<Vec<ImageSlice>> {
    if grid.columns == 0 || grid.rows == 0 {
        return Err(BackendError::InvalidGrid(format!(
            "{}x{} grid has no cells",
            grid.columns, grid.rows
        )));
    }
    let cell = cell_size(composite.dimensions(), grid);
    if cell.0 == 0 || cell.1 == 0 {
        return Err(BackendError::InvalidGrid(format!(
            "{}x{} composite is too small for a {}x{} grid",
            composite.width(),
            composite.height(),
            grid.columns,
            grid.rows
        )));
    }
    debug!(
        "slicing {}x{} composite into {} cells of {}x{}",
        composite.width(),
        composite.height(),
        grid.cell_count(),
        cell.0,
        cell.1
    );

    (1..=grid.cell_count())
        .into_par_iter()
        .map(|index| render_cell(backend, composite, grid, cell, index, options))
        .collect()
}

/// Decode a composite and slice it. Decode failures fail the whole call.
pub fn slice_composite(
    backend: &impl ImageBackend,
    bytes: &[u8],
    grid: GridSpec,
    options: &SliceOptions,
) -> Result<Vec<ImageSlice>> {
    let composite = backend.decode(bytes)?;
    slice_grid(backend, &composite, grid, options)
}

fn render_cell(
    backend: &impl ImageBackend,
    composite: &RasterImage,
    grid: GridSpec,
    cell: (u32, u32),
    index: u32,
    options: &SliceOptions,
) -> Result<ImageSlice> {
    let region = cell_rect(grid, cell, index);
    let mut canvas = backend.canvas(cell.0, cell.1)?;
    if options.corner_radius > 0.0 {
        canvas.clip_to_rounded_rect(corner_radius_px(cell, options.corner_radius));
    }
    canvas.draw_region(
        composite,
        region,
        Placement {
            x: 0,
            y: 0,
            width: cell.0,
            height: cell.1,
        },
    )?;

    Ok(ImageSlice {
        index,
        width: cell.0,
        height: cell.1,
        file_name: slice_file_name(index, options.encode.format),
        bytes: canvas.export(options.encode)?,
    })
}

/// Scale and centre-crop `source` to exactly `target`, with no letterboxing.
///
/// The scale is `max(target_w / source_w, target_h / source_h)`, so smaller
/// sources are upscaled. The scaled image is drawn centred and the canvas
/// bounds clip the excess. The result is always opaque: translucent source
/// pixels are composited over [`COVER_BACKGROUND`].
pub fn cover_fit(
    backend: &impl ImageBackend,
    source: &RasterImage,
    kind: FittedKind,
    target: (u32, u32),
    encode: EncodeOptions,
) -> Result<FittedAsset> {
    if target.0 == 0 || target.1 == 0 {
        return Err(BackendError::InvalidTarget(format!(
            "{} target {}x{} has no pixels",
            kind.as_str(),
            target.0,
            target.1
        )));
    }
    let (src_w, src_h) = source.dimensions();
    let fit = cover_placement((src_w, src_h), target);
    debug!(
        "cover fit {} {}x{} -> {}x{} (scale {:.4}, offset {},{})",
        kind.as_str(),
        src_w,
        src_h,
        target.0,
        target.1,
        fit.scale,
        fit.placement.x,
        fit.placement.y
    );

    let mut canvas = backend.canvas(target.0, target.1)?;
    canvas.draw_region(source, Rect::new(0, 0, src_w, src_h), fit.placement)?;
    canvas.flatten(COVER_BACKGROUND);

    Ok(FittedAsset {
        kind,
        width: target.0,
        height: target.1,
        file_name: fitted_file_name(kind, encode.format),
        bytes: canvas.export(encode)?,
    })
}

/// Decode an image and cover-fit it.
pub fn fit_encoded(
    backend: &impl ImageBackend,
    bytes: &[u8],
    kind: FittedKind,
    target: (u32, u32),
    encode: EncodeOptions,
) -> Result<FittedAsset> {
    let source = backend.decode(bytes)?;
    cover_fit(backend, &source, kind, target, encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{decode_rgba, encode_png, gradient_image};
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;

    fn plain() -> SliceOptions {
        SliceOptions::default()
    }

    fn translucent_gradient(width: u32, height: u32, alpha: u8) -> RgbaImage {
        let mut image = gradient_image(width, height);
        for pixel in image.pixels_mut() {
            pixel[3] = alpha;
        }
        image
    }

    // =========================================================================
    // slice_grid with the mock backend
    // =========================================================================

    #[test]
    fn slice_grid_plans_one_canvas_per_cell() {
        let backend = MockBackend::new();
        let composite = RasterImage::from_rgba(RgbaImage::new(600, 400));

        let slices = slice_grid(&backend, &composite, GridSpec::new(6, 4), &plain()).unwrap();
        assert_eq!(slices.len(), 24);

        let ops = backend.get_operations();
        let canvases = ops
            .iter()
            .filter(|op| matches!(op, RecordedOp::Canvas { width: 100, height: 100 }))
            .count();
        assert_eq!(canvases, 24);
        assert!(ops.contains(&RecordedOp::Draw {
            region: Rect::new(500, 300, 100, 100),
            placement: Placement {
                x: 0,
                y: 0,
                width: 100,
                height: 100
            },
        }));
        assert!(!ops.iter().any(|op| matches!(op, RecordedOp::Clip(_))));
    }

    #[test]
    fn slice_grid_applies_corner_mask_when_requested() {
        let backend = MockBackend::new();
        let composite = RasterImage::from_rgba(RgbaImage::new(200, 100));
        let options = SliceOptions {
            corner_radius: 0.05,
            ..SliceOptions::default()
        };

        slice_grid(&backend, &composite, GridSpec::new(2, 1), &options).unwrap();

        let clips: Vec<_> = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Clip(_)))
            .collect();
        assert_eq!(clips, vec![RecordedOp::Clip(5), RecordedOp::Clip(5)]);
    }

    #[test]
    fn slice_grid_rejects_empty_grid() {
        let backend = MockBackend::new();
        let composite = RasterImage::from_rgba(RgbaImage::new(60, 40));
        let result = slice_grid(&backend, &composite, GridSpec::new(0, 4), &plain());
        assert!(matches!(result, Err(BackendError::InvalidGrid(_))));
    }

    #[test]
    fn slice_grid_rejects_composite_smaller_than_grid() {
        let backend = MockBackend::new();
        let composite = RasterImage::from_rgba(RgbaImage::new(5, 40));
        let result = slice_grid(&backend, &composite, GridSpec::new(6, 4), &plain());
        assert!(matches!(result, Err(BackendError::InvalidGrid(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn slice_composite_decode_failure_returns_nothing() {
        let result = slice_composite(
            &RustBackend::new(),
            b"not an image",
            GridSpec::default(),
            &plain(),
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    // =========================================================================
    // slice_grid with real pixels
    // =========================================================================

    #[test]
    fn slices_uhd_composite_into_named_cells() {
        let backend = RustBackend::new();
        let composite = RasterImage::from_rgba(gradient_image(3840, 2160));

        let slices = slice_grid(&backend, &composite, GridSpec::new(6, 4), &plain()).unwrap();

        assert_eq!(slices.len(), 24);
        for (i, slice) in slices.iter().enumerate() {
            let index = i as u32 + 1;
            assert_eq!(slice.index, index);
            assert_eq!((slice.width, slice.height), (640, 540));
            assert_eq!(slice.file_name, format!("meme_{:02}.png", index));
        }
        assert_eq!(slices[0].file_name, "meme_01.png");
        assert_eq!(slices[23].file_name, "meme_24.png");

        // Cell 8 is row 1, column 1
        let eighth = decode_rgba(&slices[7].bytes);
        assert_eq!(eighth.dimensions(), (640, 540));
        assert_eq!(eighth.get_pixel(0, 0), composite.pixels().get_pixel(640, 540));
    }

    #[test]
    fn slices_reassemble_to_cropped_composite() {
        let backend = RustBackend::new();
        // 7 and 3 leftover pixels are dropped
        let composite = RasterImage::from_rgba(gradient_image(307, 203));
        let grid = GridSpec::new(6, 4);

        let slices = slice_grid(&backend, &composite, grid, &plain()).unwrap();
        let (cw, ch) = (slices[0].width, slices[0].height);
        assert_eq!((cw, ch), (50, 50));

        let mut rebuilt = RgbaImage::new(grid.columns * cw, grid.rows * ch);
        for slice in &slices {
            let row = (slice.index - 1) / grid.columns;
            let col = (slice.index - 1) % grid.columns;
            let cell = decode_rgba(&slice.bytes);
            image::imageops::replace(&mut rebuilt, &cell, (col * cw) as i64, (row * ch) as i64);
        }

        let expected =
            image::imageops::crop_imm(composite.pixels(), 0, 0, rebuilt.width(), rebuilt.height())
                .to_image();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn rounded_slices_keep_content_inside_mask() {
        let backend = RustBackend::new();
        let composite = RasterImage::from_rgba(gradient_image(200, 100));
        let options = SliceOptions {
            corner_radius: 0.1,
            ..SliceOptions::default()
        };

        let slices = slice_grid(&backend, &composite, GridSpec::new(2, 1), &options).unwrap();
        let second = decode_rgba(&slices[1].bytes);

        assert_eq!(second.get_pixel(0, 0)[3], 0);
        assert_eq!(second.get_pixel(50, 50), composite.pixels().get_pixel(150, 50));
    }

    // =========================================================================
    // cover_fit
    // =========================================================================

    #[test]
    fn cover_fit_plans_centred_placement() {
        let backend = MockBackend::new();
        let source = RasterImage::from_rgba(RgbaImage::new(1000, 1000));

        let banner = cover_fit(
            &backend,
            &source,
            FittedKind::Banner,
            (750, 400),
            EncodeOptions::png(),
        )
        .unwrap();
        assert_eq!(banner.file_name, "banner.png");
        assert_eq!((banner.width, banner.height), (750, 400));

        let ops = backend.get_operations();
        assert_eq!(
            ops[1],
            RecordedOp::Draw {
                region: Rect::new(0, 0, 1000, 1000),
                placement: Placement {
                    x: 0,
                    y: -175,
                    width: 750,
                    height: 750
                },
            }
        );
        assert_eq!(ops[2], RecordedOp::Flatten(COVER_BACKGROUND));
    }

    #[test]
    fn cover_fit_clips_top_and_bottom_of_square_source() {
        let backend = RustBackend::new();
        // Top 200 rows red: after 0.75 scale they end 25px above the canvas
        let source = RasterImage::from_rgba(RgbaImage::from_fn(1000, 1000, |_, y| {
            if y < 200 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 255, 0, 255])
            }
        }));

        let banner = cover_fit(
            &backend,
            &source,
            FittedKind::Banner,
            (750, 400),
            EncodeOptions::png(),
        )
        .unwrap();
        let pixels = decode_rgba(&banner.bytes);

        assert_eq!(pixels.dimensions(), (750, 400));
        for p in pixels.pixels() {
            assert_eq!(p[3], 255);
            assert!(p[0] < 32 && p[1] > 223, "unexpected pixel {p:?}");
        }
    }

    #[test]
    fn cover_fit_same_aspect_equals_plain_resize() {
        let backend = RustBackend::new();
        let source = RasterImage::from_rgba(gradient_image(300, 160));

        let logo = cover_fit(
            &backend,
            &source,
            FittedKind::Logo,
            (150, 80),
            EncodeOptions::png(),
        )
        .unwrap();

        let resized = image::imageops::resize(
            source.pixels(),
            150,
            80,
            image::imageops::FilterType::Lanczos3,
        );
        assert_eq!(decode_rgba(&logo.bytes), resized);
    }

    #[test]
    fn cover_fit_rejects_empty_target() {
        let backend = MockBackend::new();
        let source = RasterImage::from_rgba(RgbaImage::new(10, 10));
        let result = cover_fit(
            &backend,
            &source,
            FittedKind::Logo,
            (0, 240),
            EncodeOptions::png(),
        );
        assert!(matches!(result, Err(BackendError::InvalidTarget(_))));
    }

    #[test]
    fn cover_fit_transparent_source_is_opaque() {
        let backend = RustBackend::new();
        let source = RasterImage::from_rgba(RgbaImage::from_pixel(100, 100, Rgba([10, 20, 30, 0])));

        let logo = cover_fit(
            &backend,
            &source,
            FittedKind::Logo,
            (24, 24),
            EncodeOptions::png(),
        )
        .unwrap();
        let pixels = decode_rgba(&logo.bytes);

        assert_eq!(pixels.dimensions(), (24, 24));
        assert!(pixels.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn cover_fit_one_pixel_wide_source() {
        let backend = RustBackend::new();
        let source = RasterImage::from_rgba(gradient_image(1, 2000));

        let banner = cover_fit(
            &backend,
            &source,
            FittedKind::Banner,
            (750, 400),
            EncodeOptions::png(),
        )
        .unwrap();
        let pixels = decode_rgba(&banner.bytes);

        assert_eq!(pixels.dimensions(), (750, 400));
        assert!(pixels.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn fit_encoded_rejects_garbage() {
        let result = fit_encoded(
            &RustBackend::new(),
            b"\x89PNG but not really",
            FittedKind::Logo,
            (240, 240),
            EncodeOptions::png(),
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    // =========================================================================
    // properties
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn slice_count_dims_and_indices(
            width in 6u32..160,
            height in 4u32..120,
            columns in 1u32..7,
            rows in 1u32..5,
        ) {
            let backend = RustBackend::new();
            let composite = RasterImage::from_rgba(gradient_image(width, height));
            let grid = GridSpec::new(columns, rows);

            let slices = slice_grid(&backend, &composite, grid, &plain()).unwrap();

            prop_assert_eq!(slices.len() as u32, columns * rows);
            for (i, slice) in slices.iter().enumerate() {
                prop_assert_eq!(slice.index, i as u32 + 1);
                prop_assert_eq!(slice.width, width / columns);
                prop_assert_eq!(slice.height, height / rows);
            }
        }

        #[test]
        fn cover_fit_always_fills_target(
            src_w in 1u32..120,
            src_h in 1u32..120,
            tgt_w in 1u32..90,
            tgt_h in 1u32..90,
            alpha in any::<u8>(),
        ) {
            let backend = RustBackend::new();
            let source = RasterImage::from_rgba(translucent_gradient(src_w, src_h, alpha));

            let fitted = cover_fit(
                &backend,
                &source,
                FittedKind::Banner,
                (tgt_w, tgt_h),
                EncodeOptions::png(),
            )
            .unwrap();
            let pixels = decode_rgba(&fitted.bytes);

            prop_assert_eq!(pixels.dimensions(), (tgt_w, tgt_h));
            prop_assert!(pixels.pixels().all(|p| p[3] == 255));
        }

        #[test]
        fn cover_fit_handles_extreme_aspect_ratios(
            long in 500u32..6000,
            tall in any::<bool>(),
            tgt_w in 1u32..800,
            tgt_h in 1u32..450,
            alpha in any::<u8>(),
        ) {
            let (src_w, src_h) = if tall { (1, long) } else { (long, 1) };
            let backend = RustBackend::new();
            let source = RasterImage::from_rgba(translucent_gradient(src_w, src_h, alpha));

            let fitted = cover_fit(
                &backend,
                &source,
                FittedKind::Banner,
                (tgt_w, tgt_h),
                EncodeOptions::png(),
            )
            .unwrap();
            let pixels = decode_rgba(&fitted.bytes);

            prop_assert_eq!(pixels.dimensions(), (tgt_w, tgt_h));
            prop_assert!(pixels.pixels().all(|p| p[3] == 255));
        }
    }

    #[test]
    fn encoded_slice_buffers_are_independent() {
        let backend = RustBackend::new();
        let bytes = encode_png(&gradient_image(120, 80));

        let slices = slice_composite(&backend, &bytes, GridSpec::new(3, 2), &plain()).unwrap();
        drop(bytes);

        for slice in slices {
            let decoded = decode_rgba(&slice.bytes);
            assert_eq!(decoded.dimensions(), (40, 40));
        }
    }
}
