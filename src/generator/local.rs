//! Offline generator over images that already exist on disk.
//!
//! Lets the full slice/fit/package pipeline run without network access,
//! e.g. to re-package assets from an earlier run.

use super::{AssetGenerator, GenerationParams, GeneratorError};
use crate::types::{AssetKind, Metadata};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalAssets {
    pub composite: PathBuf,
    pub banner: PathBuf,
    pub logo: PathBuf,
    pub metadata: Metadata,
}

fn read_image(path: &Path, asset: AssetKind) -> Result<Vec<u8>, GeneratorError> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(GeneratorError::NoImageData { asset });
    }
    Ok(bytes)
}

impl AssetGenerator for LocalAssets {
    fn generate_composite(&self, _: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
        read_image(&self.composite, AssetKind::Composite)
    }

    fn generate_banner(&self, _: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
        read_image(&self.banner, AssetKind::Banner)
    }

    fn generate_logo(&self, _: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
        read_image(&self.logo, AssetKind::Logo)
    }

    fn generate_metadata(&self, _: &GenerationParams) -> Result<Metadata, GeneratorError> {
        Ok(self.metadata.clone())
    }
}
