//! The asset generation boundary.
//!
//! The pack needs four things from the outside world: a composite grid
//! image, a banner, a logo, and a title/description. [`AssetGenerator`]
//! names those four calls; everything else in the crate is agnostic to
//! where the bytes come from.
//!
//! | Implementation | Source |
//! |---|---|
//! | [`GeminiGenerator`] | one `generateContent` POST per asset |
//! | [`LocalAssets`] | images already on disk, fixed metadata |
//!
//! Errors distinguish a response that carried no usable image
//! ([`GeneratorError::NoImageData`]) from transport or API failures
//! ([`GeneratorError::Service`]). The pipeline treats both as fatal.

pub mod credentials;
pub mod gemini;
pub mod local;

pub use credentials::{ApiKeyProvider, EnvApiKey, StaticApiKey};
pub use gemini::GeminiGenerator;
pub use local::LocalAssets;

use crate::types::{AssetKind, Metadata};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("No image data in {asset} response")]
    NoImageData { asset: AssetKind },
    #[error("Generation service error: {0}")]
    Service(String),
    #[error("Missing API key: {0}")]
    MissingCredentials(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An optional image the generator should take as a style reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    /// Read a reference image from disk, inferring its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, GeneratorError> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            bytes,
            mime_type: mime_type_for(path).to_string(),
        })
    }
}

/// Input shared by all four generation calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationParams {
    pub prompt: String,
    pub reference: Option<ReferenceImage>,
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceImage) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Guess an image MIME type from a file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        _ => "image/png",
    }
}

/// Producer of the raw assets a pack is built from.
///
/// `Sync` so the pipeline can issue all four calls concurrently.
pub trait AssetGenerator: Sync {
    /// Encoded image containing every grid cell.
    fn generate_composite(&self, params: &GenerationParams) -> Result<Vec<u8>, GeneratorError>;

    /// Encoded banner image, any size; it is cover-fitted afterwards.
    fn generate_banner(&self, params: &GenerationParams) -> Result<Vec<u8>, GeneratorError>;

    /// Encoded logo image, any size; it is cover-fitted afterwards.
    fn generate_logo(&self, params: &GenerationParams) -> Result<Vec<u8>, GeneratorError>;

    /// Title and description of the pack.
    fn generate_metadata(&self, params: &GenerationParams) -> Result<Metadata, GeneratorError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted generator returning canned bytes, optionally failing one asset.
    /// Records every call so tests can check all four were issued.
    pub struct MockGenerator {
        pub composite: Vec<u8>,
        pub banner: Vec<u8>,
        pub logo: Vec<u8>,
        pub metadata: Metadata,
        pub fail: Option<AssetKind>,
        pub calls: Mutex<Vec<AssetKind>>,
    }

    impl MockGenerator {
        pub fn new(composite: Vec<u8>, banner: Vec<u8>, logo: Vec<u8>) -> Self {
            Self {
                composite,
                banner,
                logo,
                metadata: Metadata {
                    title: "Office Cats".into(),
                    description: "Cats doing office things.".into(),
                },
                fail: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(mut self, asset: AssetKind) -> Self {
            self.fail = Some(asset);
            self
        }

        pub fn get_calls(&self) -> Vec<AssetKind> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, asset: AssetKind) -> Result<(), GeneratorError> {
            self.calls.lock().unwrap().push(asset);
            if self.fail == Some(asset) {
                return Err(GeneratorError::Service(format!("{asset} request rejected")));
            }
            Ok(())
        }
    }

    impl AssetGenerator for MockGenerator {
        fn generate_composite(&self, _: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
            self.record(AssetKind::Composite)?;
            Ok(self.composite.clone())
        }

        fn generate_banner(&self, _: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
            self.record(AssetKind::Banner)?;
            Ok(self.banner.clone())
        }

        fn generate_logo(&self, _: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
            self.record(AssetKind::Logo)?;
            Ok(self.logo.clone())
        }

        fn generate_metadata(&self, _: &GenerationParams) -> Result<Metadata, GeneratorError> {
            self.record(AssetKind::Metadata)?;
            Ok(self.metadata.clone())
        }
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(mime_type_for(Path::new("ref.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("ref.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("ref.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("ref")), "image/png");
    }

    #[test]
    fn reference_image_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("style.jpeg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let reference = ReferenceImage::from_path(&path).unwrap();
        assert_eq!(reference.bytes, b"jpeg bytes");
        assert_eq!(reference.mime_type, "image/jpeg");
    }

    #[test]
    fn reference_image_missing_file_is_io_error() {
        let result = ReferenceImage::from_path(Path::new("/nonexistent/style.png"));
        assert!(matches!(result, Err(GeneratorError::Io(_))));
    }

    #[test]
    fn no_image_data_names_the_asset() {
        let err = GeneratorError::NoImageData {
            asset: AssetKind::Banner,
        };
        assert_eq!(err.to_string(), "No image data in banner response");
    }
}
