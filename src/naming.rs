//! Centralized file naming for everything that goes into a pack.
//!
//! | Asset | Name |
//! |---|---|
//! | Grid cell 7 | `meme_07.png` |
//! | Banner | `banner.png` |
//! | Logo | `logo.png` |
//! | Text metadata | `info.txt` |
//!
//! Slice indices are zero-padded to two digits so a plain lexicographic sort
//! of the archive reads left-to-right, top-to-bottom. Config validation caps
//! the grid at [`MAX_CELLS`] so the padding always holds.

use crate::imaging::OutputFormat;
use crate::types::FittedKind;

/// Largest grid whose slice names still sort in reading order.
pub const MAX_CELLS: u32 = 99;

/// Name of the generated text manifest.
pub const INFO_FILE_NAME: &str = "info.txt";

/// File name for the slice at a 1-based index, e.g. `meme_01.png`.
pub fn slice_file_name(index: u32, format: OutputFormat) -> String {
    format!("meme_{:02}.{}", index, format.extension())
}

/// File name for a banner or logo, e.g. `banner.png`.
pub fn fitted_file_name(kind: FittedKind, format: OutputFormat) -> String {
    format!("{}.{}", kind.as_str(), format.extension())
}

/// Path of a file inside the archive, under an optional directory prefix.
pub fn archive_path(dir: &str, file_name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir, file_name)
    }
}
