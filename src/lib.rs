//! # meme-pack
//!
//! Builds a themed sticker pack from one text prompt: a grid of stickers, a
//! banner, a logo and a title/description, bundled into `meme_pack.zip`.
//!
//! # Architecture: Generate → Transform → Package
//!
//! ```text
//! 1. Generate   prompt (+ reference)  →  composite, banner, logo, metadata
//! 2. Transform  composite             →  24 × meme_NN.png   (grid slice)
//!               banner, logo          →  750x400, 240x240   (cover fit)
//! 3. Package    everything            →  meme_pack.zip + info.txt
//! ```
//!
//! Generation is the only step that leaves the process. It sits behind the
//! [`generator::AssetGenerator`] trait, so the transforms and the packaging
//! run the same way against the live API, local files or a test double.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generator`] | The four generation calls: Gemini over HTTP, or local files |
//! | [`imaging`] | Grid slicing and cover fitting behind a raster canvas trait |
//! | [`package`] | Archive layout, `info.txt`, zip and directory writers |
//! | [`pipeline`] | Concurrent generation, transforms, output, progress events |
//! | [`config`] | `pack.toml` loading, merging with stock defaults, validation |
//! | [`types`] | Assets shared between stages (`ImageSlice`, `FittedAsset`, `StickerPack`) |
//! | [`naming`] | File names inside the pack |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Floor-Sized Cells
//!
//! Cells are `floor(width / columns) × floor(height / rows)`. Remainder pixels
//! on the right and bottom edges are dropped rather than spread over the last
//! row and column, so every sticker has the same size and reassembling them
//! in row-major order reproduces the top-left `columns*cell × rows*cell`
//! region exactly.
//!
//! ## Draw Then Clip
//!
//! Cover fitting never crops the source up front. The whole source is scaled
//! by `max(tw/sw, th/sh)` and drawn centred at a non-positive offset; the
//! canvas bounds discard the overflow. The backend only resamples the source
//! pixels that end up visible, so a 1×2000 strip fits a banner as cheaply as a
//! square does. Translucent pixels are flattened onto white afterwards. The
//! same canvas primitive drives the exact-copy slices, so both transforms
//! share one code path per backend.
//!
//! ## All or Nothing
//!
//! A batch either produces a complete pack or nothing. There is no per-asset
//! retry and no partial archive; re-running the command is the recovery.

pub mod config;
pub mod generator;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
