//! Orchestration: generate, transform, package.
//!
//! ```text
//! AssetGenerator ──┬── composite ──► slice_composite ──► 24 × ImageSlice ─┐
//!                  ├── banner ─────► fit_encoded ──────► FittedAsset ─────┤
//!                  ├── logo ───────► fit_encoded ──────► FittedAsset ─────┼──► PackageWriter
//!                  └── metadata ───────────────────────────────────────────┘
//! ```
//!
//! The four generation requests are issued together, one scoped thread each,
//! and all of them settle before any result is looked at. Rayon only runs the
//! slicing.
//! Any failure fails the batch; the first error in the order composite,
//! banner, logo, metadata is the one reported. Nothing partial is kept,
//! so a failed batch is simply re-run.
//!
//! Cancellation is cooperative and only checked before a request is issued.
//! Once the transforms start they run to completion.
//!
//! Progress goes out as [`PackEvent`] values on an optional channel; the CLI
//! formats them with [`crate::output`].

use crate::config::{ConfigError, PackConfig};
use crate::generator::{AssetGenerator, GenerationParams, GeneratorError};
use crate::imaging::{BackendError, ImageBackend, fit_encoded, slice_composite};
use crate::package::{DirectoryWriter, PackageError, PackageWriter, archive_entries, write_archive};
use crate::types::{AssetKind, FittedKind, Metadata, StickerPack};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, ScopedJoinHandle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Generation failed: {0}")]
    Generator(#[from] GeneratorError),
    #[error("Packaging failed: {0}")]
    Package(#[from] PackageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cancelled before the {0} request was issued")]
    Cancelled(AssetKind),
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress events emitted while a pack is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackEvent {
    RequestIssued {
        asset: AssetKind,
    },
    AssetReceived {
        asset: AssetKind,
    },
    Sliced {
        count: usize,
        cell_width: u32,
        cell_height: u32,
    },
    Fitted {
        kind: FittedKind,
        width: u32,
        height: u32,
    },
    ArchiveWritten {
        path: PathBuf,
        entries: usize,
    },
    Extracted {
        dir: PathBuf,
    },
}

/// Raw generator output for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAssets {
    pub composite: Vec<u8>,
    pub banner: Vec<u8>,
    pub logo: Vec<u8>,
    pub metadata: Metadata,
}

/// Where a finished run put its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    pub pack: StickerPack,
    pub archive: PathBuf,
    pub entries: usize,
    pub extracted: Option<PathBuf>,
}

/// Output locations for [`run`].
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub dir: PathBuf,
    /// Also write loose files under `<dir>/<archive stem>/`.
    pub extract: bool,
}

fn emit(events: Option<&Sender<PackEvent>>, event: PackEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

fn issue<T>(
    asset: AssetKind,
    cancel: &CancelToken,
    events: Option<&Sender<PackEvent>>,
    request: impl FnOnce() -> Result<T, GeneratorError>,
) -> Result<T, PackError> {
    if cancel.is_cancelled() {
        return Err(PackError::Cancelled(asset));
    }
    debug!("issuing {asset} request");
    emit(events, PackEvent::RequestIssued { asset });
    let value = request()?;
    emit(events, PackEvent::AssetReceived { asset });
    Ok(value)
}

/// Wait for a request thread, re-raising its panic if it had one.
fn settle<T>(handle: ScopedJoinHandle<'_, Result<T, PackError>>) -> Result<T, PackError> {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Issue all four generation requests concurrently and wait for every one.
///
/// Each request gets its own scoped thread, whatever the rayon pool size.
pub fn generate_all(
    generator: &impl AssetGenerator,
    params: &GenerationParams,
    cancel: &CancelToken,
    events: Option<&Sender<PackEvent>>,
) -> Result<GeneratedAssets, PackError> {
    let (composite, banner, logo, metadata) = thread::scope(|scope| {
        let composite = scope.spawn(|| {
            issue(AssetKind::Composite, cancel, events, || {
                generator.generate_composite(params)
            })
        });
        let banner = scope.spawn(|| {
            issue(AssetKind::Banner, cancel, events, || {
                generator.generate_banner(params)
            })
        });
        let logo = scope.spawn(|| {
            issue(AssetKind::Logo, cancel, events, || generator.generate_logo(params))
        });
        let metadata = scope.spawn(|| {
            issue(AssetKind::Metadata, cancel, events, || {
                generator.generate_metadata(params)
            })
        });
        (
            settle(composite),
            settle(banner),
            settle(logo),
            settle(metadata),
        )
    });

    // Fields are evaluated in order, which fixes which error wins.
    Ok(GeneratedAssets {
        composite: composite?,
        banner: banner?,
        logo: logo?,
        metadata: metadata?,
    })
}

/// Slice the composite and cover-fit banner and logo.
pub fn build_pack(
    backend: &impl ImageBackend,
    assets: GeneratedAssets,
    config: &PackConfig,
    events: Option<&Sender<PackEvent>>,
) -> Result<StickerPack, PackError> {
    let encode = config.encode_options();

    let slices = slice_composite(
        backend,
        &assets.composite,
        config.grid_spec(),
        &config.slice_options(),
    )?;
    if let Some(first) = slices.first() {
        emit(
            events,
            PackEvent::Sliced {
                count: slices.len(),
                cell_width: first.width,
                cell_height: first.height,
            },
        );
    }

    let fit = |bytes: &[u8], kind: FittedKind, target: (u32, u32)| {
        let asset = fit_encoded(backend, bytes, kind, target, encode)?;
        emit(
            events,
            PackEvent::Fitted {
                kind,
                width: asset.width,
                height: asset.height,
            },
        );
        Ok::<_, PackError>(asset)
    };
    let banner = fit(&assets.banner, FittedKind::Banner, config.banner_size())?;
    let logo = fit(&assets.logo, FittedKind::Logo, config.logo_size())?;

    Ok(StickerPack {
        slices,
        banner,
        logo,
        metadata: assets.metadata,
    })
}

/// Write a pack to `<dir>/<archive_name>`, and optionally as loose files.
pub fn write_outputs(
    pack: StickerPack,
    config: &PackConfig,
    target: &OutputTarget,
    events: Option<&Sender<PackEvent>>,
) -> Result<PackOutcome, PackError> {
    let archive = target.dir.join(&config.package.archive_name);
    let entries = write_archive(&pack, &config.package, &archive)?;
    info!("wrote {} entries to {}", entries, archive.display());
    emit(
        events,
        PackEvent::ArchiveWritten {
            path: archive.clone(),
            entries,
        },
    );

    let extracted = if target.extract {
        let dir = extract_dir(&target.dir, &config.package.archive_name);
        DirectoryWriter::new(&dir).write_pack(&archive_entries(&pack, &config.package))?;
        emit(events, PackEvent::Extracted { dir: dir.clone() });
        Some(dir)
    } else {
        None
    };

    Ok(PackOutcome {
        pack,
        archive,
        entries,
        extracted,
    })
}

fn extract_dir(dir: &Path, archive_name: &str) -> PathBuf {
    let stem = Path::new(archive_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_name.to_string());
    dir.join(stem)
}

/// Full batch: generate, transform and write.
pub fn run(
    generator: &impl AssetGenerator,
    backend: &impl ImageBackend,
    params: &GenerationParams,
    config: &PackConfig,
    target: &OutputTarget,
    cancel: &CancelToken,
    events: Option<&Sender<PackEvent>>,
) -> Result<PackOutcome, PackError> {
    let assets = generate_all(generator, params, cancel, events)?;
    let pack = build_pack(backend, assets, config, events)?;
    write_outputs(pack, config, target, events)
}
