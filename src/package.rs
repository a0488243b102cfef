//! Packaging: turn a finished [`StickerPack`] into named blobs and write them.
//!
//! ## Archive layout
//!
//! ```text
//! meme_pack.zip
//! ├── stickers/
//! │   ├── meme_01.png
//! │   ├── ...
//! │   └── meme_24.png
//! ├── banner.png
//! ├── logo.png
//! └── info.txt
//! ```
//!
//! `info.txt` holds the title, a blank line, the description and an
//! attribution line. The same entries can be written as a zip
//! ([`ZipPackage`]) or as loose files ([`DirectoryWriter`]).

use crate::config::PackageConfig;
use crate::naming::{INFO_FILE_NAME, archive_path};
use crate::types::{Metadata, StickerPack};
use std::borrow::Cow;
use std::fs;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::FileOptions;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One named file of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry<'a> {
    /// Path inside the package, `/`-separated.
    pub path: String,
    pub bytes: Cow<'a, [u8]>,
}

/// Render the text manifest.
pub fn info_text(metadata: &Metadata, attribution: &str) -> String {
    format!(
        "Title: {}\n\nDescription:\n{}\n\n{}\n",
        metadata.title, metadata.description, attribution
    )
}

/// All entries of a pack in archive order: slices, banner, logo, `info.txt`.
pub fn archive_entries<'a>(pack: &'a StickerPack, config: &PackageConfig) -> Vec<PackageEntry<'a>> {
    let mut entries: Vec<PackageEntry<'a>> = pack
        .slices
        .iter()
        .map(|slice| PackageEntry {
            path: archive_path(&config.sticker_dir, &slice.file_name),
            bytes: Cow::Borrowed(slice.bytes.as_slice()),
        })
        .collect();

    for asset in [&pack.banner, &pack.logo] {
        entries.push(PackageEntry {
            path: asset.file_name.clone(),
            bytes: Cow::Borrowed(asset.bytes.as_slice()),
        });
    }

    entries.push(PackageEntry {
        path: INFO_FILE_NAME.to_string(),
        bytes: Cow::Owned(info_text(&pack.metadata, &config.attribution).into_bytes()),
    });
    entries
}

/// Destination for a list of package entries.
pub trait PackageWriter {
    fn write_pack(&mut self, entries: &[PackageEntry<'_>]) -> Result<(), PackageError>;
}

/// Writes entries as a zip archive into any seekable writer.
pub struct ZipPackage<W: Write + Seek> {
    writer: W,
}

impl<W: Write + Seek> ZipPackage<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Seek> PackageWriter for ZipPackage<W> {
    fn write_pack(&mut self, entries: &[PackageEntry<'_>]) -> Result<(), PackageError> {
        let mut zip = zip::ZipWriter::new(&mut self.writer);
        for entry in entries {
            // Images are already compressed; only text benefits from deflate.
            let method = if entry.path.ends_with(".txt") {
                CompressionMethod::Deflated
            } else {
                CompressionMethod::Stored
            };
            let options = FileOptions::default()
                .compression_method(method)
                .unix_permissions(0o644);
            zip.start_file(entry.path.as_str(), options)?;
            zip.write_all(&entry.bytes)?;
        }
        zip.finish()?;
        Ok(())
    }
}

/// Writes entries as loose files under a root directory.
pub struct DirectoryWriter {
    root: PathBuf,
}

impl DirectoryWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PackageWriter for DirectoryWriter {
    fn write_pack(&mut self, entries: &[PackageEntry<'_>]) -> Result<(), PackageError> {
        for entry in entries {
            let path = self.root.join(&entry.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &entry.bytes)?;
        }
        Ok(())
    }
}

/// Write a pack as a zip file at `path`. Returns the number of entries.
pub fn write_archive(
    pack: &StickerPack,
    config: &PackageConfig,
    path: &Path,
) -> Result<usize, PackageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let entries = archive_entries(pack, config);
    let file = fs::File::create(path)?;
    let mut package = ZipPackage::new(BufWriter::new(file));
    package.write_pack(&entries)?;
    package.into_inner().flush()?;
    Ok(entries.len())
}
