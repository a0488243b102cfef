//! Shared types used across the pipeline.
//!
//! Every output asset owns its encoded bytes outright. Nothing here borrows
//! from another asset's buffer, so each one can be written, downloaded or
//! dropped independently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title and description of a pack, passed through to the archive unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
}

/// One of the four things the generator is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Composite,
    Banner,
    Logo,
    Metadata,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Composite => "composite",
            AssetKind::Banner => "banner",
            AssetKind::Logo => "logo",
            AssetKind::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// Which cover-fitted asset a [`FittedAsset`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FittedKind {
    Banner,
    Logo,
}

impl FittedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FittedKind::Banner => "banner",
            FittedKind::Logo => "logo",
        }
    }
}

/// One grid cell cut from the composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlice {
    /// 1-based, row-major.
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A banner or logo, cover-fitted to its exact target size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedAsset {
    pub kind: FittedKind,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything that ends up in the downloadable archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickerPack {
    pub slices: Vec<ImageSlice>,
    pub banner: FittedAsset,
    pub logo: FittedAsset,
    pub metadata: Metadata,
}
