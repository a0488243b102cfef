//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each sticker leads with its positional index and file name, with its pixel
//! size as trailing context. Banner and logo show where they ended up. The
//! pack itself is introduced by its title.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! Requesting composite
//! Requesting banner
//!     banner: received
//!     composite: received
//! Sliced 24 stickers (640x540 each)
//! banner: 750x400
//! logo: 240x240
//! Archive → out/meme_pack.zip (27 files)
//! ```
//!
//! ## Summary
//!
//! ```text
//! Office Cats
//!     Description: Cats doing office things.
//! Stickers (24)
//!     001 meme_01.png (640x540)
//!     002 meme_02.png (640x540)
//! Banner → banner.png (750x400)
//! Logo → logo.png (240x240)
//! Packed 24 stickers → out/meme_pack.zip
//! ```
//!
//! # Architecture
//!
//! Every view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{PackEvent, PackOutcome};
use crate::types::{FittedAsset, ImageSlice};
use std::path::Path;

const DESCRIPTION_WIDTH: usize = 60;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: u32) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Progress events
// ============================================================================

/// Format a single pipeline progress event as display lines.
pub fn format_pack_event(event: &PackEvent) -> Vec<String> {
    match event {
        PackEvent::RequestIssued { asset } => vec![format!("Requesting {}", asset)],
        PackEvent::AssetReceived { asset } => {
            vec![format!("{}{}: received", indent(1), asset)]
        }
        PackEvent::Sliced {
            count,
            cell_width,
            cell_height,
        } => vec![format!(
            "Sliced {} stickers ({}x{} each)",
            count, cell_width, cell_height
        )],
        PackEvent::Fitted {
            kind,
            width,
            height,
        } => vec![format!("{}: {}x{}", kind.as_str(), width, height)],
        PackEvent::ArchiveWritten { path, entries } => vec![format!(
            "Archive \u{2192} {} ({} files)",
            path.display(),
            entries
        )],
        PackEvent::Extracted { dir } => vec![format!("Extracted \u{2192} {}", dir.display())],
    }
}

// ============================================================================
// Stickers and fitted assets
// ============================================================================

/// One line per slice: index, file name, pixel size.
pub fn format_slice_list(slices: &[ImageSlice], depth: usize) -> Vec<String> {
    slices
        .iter()
        .map(|slice| {
            format!(
                "{}{} {} ({}x{})",
                indent(depth),
                format_index(slice.index),
                slice.file_name,
                slice.width,
                slice.height
            )
        })
        .collect()
}

/// `Banner → banner.png (750x400)`, with the written path when there is one.
pub fn format_fitted(asset: &FittedAsset, written_to: Option<&Path>) -> String {
    let target = written_to
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| asset.file_name.clone());
    format!(
        "{} \u{2192} {} ({}x{})",
        capitalize(asset.kind.as_str()),
        target,
        asset.width,
        asset.height
    )
}

/// Lines for the `slice` command: the list plus where the files went.
pub fn format_slice_output(slices: &[ImageSlice], dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("Stickers ({})", slices.len())];
    lines.extend(format_slice_list(slices, 1));
    lines.push(format!(
        "Wrote {} stickers \u{2192} {}",
        slices.len(),
        dir.display()
    ));
    lines
}

pub fn print_slice_output(slices: &[ImageSlice], dir: &Path) {
    for line in format_slice_output(slices, dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Pack summary
// ============================================================================

/// Summary printed after a pack was written.
pub fn format_pack_summary(outcome: &PackOutcome) -> Vec<String> {
    let pack = &outcome.pack;
    let mut lines = vec![pack.metadata.title.clone()];
    if !pack.metadata.description.is_empty() {
        lines.push(format!(
            "{}Description: {}",
            indent(1),
            truncate_desc(&pack.metadata.description, DESCRIPTION_WIDTH)
        ));
    }

    lines.push(format!("Stickers ({})", pack.slices.len()));
    lines.extend(format_slice_list(&pack.slices, 1));
    lines.push(format_fitted(&pack.banner, None));
    lines.push(format_fitted(&pack.logo, None));

    lines.push(format!(
        "Packed {} stickers \u{2192} {}",
        pack.slices.len(),
        outcome.archive.display()
    ));
    if let Some(dir) = &outcome.extracted {
        lines.push(format!("Extracted \u{2192} {}", dir.display()));
    }
    lines
}

pub fn print_pack_summary(outcome: &PackOutcome) {
    for line in format_pack_summary(outcome) {
        println!("{}", line);
    }
}
