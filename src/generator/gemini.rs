//! Generator backed by the Gemini `generateContent` REST API.
//!
//! One blocking POST per asset, no retries. The request carries the user's
//! prompt behind a one-line instruction naming the asset, plus the optional
//! reference image as base64 inline data. Image responses are scanned for
//! the first inline image part; the metadata response is JSON text.
//!
//! Request building and response parsing are plain functions over the wire
//! types so they can be tested without a network.

use super::{ApiKeyProvider, AssetGenerator, GenerationParams, GeneratorError};
use crate::config::GeneratorConfig;
use crate::imaging::GridSpec;
use crate::types::{AssetKind, Metadata};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }
}

// ============================================================================
// Request building / response parsing
// ============================================================================

/// One-line instruction that frames the user's prompt for each asset.
pub fn asset_instruction(asset: AssetKind, grid: GridSpec) -> String {
    match asset {
        AssetKind::Composite => format!(
            "One image laid out as a {} by {} grid of {} separate stickers of equal size, \
             one per cell, with no borders or gaps between cells.",
            grid.columns,
            grid.rows,
            grid.cell_count()
        ),
        AssetKind::Banner => "A wide banner illustration for the sticker pack.".to_string(),
        AssetKind::Logo => "A square logo icon for the sticker pack.".to_string(),
        AssetKind::Metadata => "Reply with a JSON object with string fields \"title\" and \
                                \"description\" for the sticker pack."
            .to_string(),
    }
}

/// Build the request body for one asset.
pub fn build_request(asset: AssetKind, grid: GridSpec, params: &GenerationParams) -> GenerateRequest {
    let mut parts = vec![RequestPart::Text {
        text: format!("{}\nTheme: {}", asset_instruction(asset, grid), params.prompt),
    }];
    if let Some(reference) = &params.reference {
        parts.push(RequestPart::Inline {
            inline_data: InlineData {
                mime_type: reference.mime_type.clone(),
                data: STANDARD.encode(&reference.bytes),
            },
        });
    }

    let generation_config = match asset {
        AssetKind::Metadata => GenerationConfig {
            response_mime_type: Some("application/json"),
            ..GenerationConfig::default()
        },
        _ => GenerationConfig {
            response_modalities: Some(vec!["TEXT", "IMAGE"]),
            ..GenerationConfig::default()
        },
    };

    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config,
    }
}

/// Pull the first inline image out of a response.
pub fn extract_image(
    response: &GenerateResponse,
    asset: AssetKind,
) -> Result<Vec<u8>, GeneratorError> {
    let inline = response
        .parts()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| d.mime_type.starts_with("image/"))
        .ok_or(GeneratorError::NoImageData { asset })?;

    let bytes = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
        warn!("{asset} response carried undecodable base64: {e}");
        GeneratorError::NoImageData { asset }
    })?;
    if bytes.is_empty() {
        return Err(GeneratorError::NoImageData { asset });
    }
    Ok(bytes)
}

/// Parse the title/description JSON out of the text parts of a response.
pub fn extract_metadata(response: &GenerateResponse) -> Result<Metadata, GeneratorError> {
    let text: String = response.parts().filter_map(|p| p.text.as_deref()).collect();
    let json = strip_code_fence(&text);
    if json.is_empty() {
        return Err(GeneratorError::Service(
            "metadata response contained no text".into(),
        ));
    }
    let metadata: Metadata = serde_json::from_str(json)?;
    Ok(Metadata {
        title: metadata.title.trim().to_string(),
        description: metadata.description.trim().to_string(),
    })
}

/// Models sometimes wrap JSON in a ```json fence despite the MIME type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

// ============================================================================
// Client
// ============================================================================

/// Blocking Gemini client. Safe to share across rayon workers.
pub struct GeminiGenerator<K: ApiKeyProvider> {
    client: reqwest::blocking::Client,
    config: GeneratorConfig,
    grid: GridSpec,
    keys: K,
}

impl<K: ApiKeyProvider> GeminiGenerator<K> {
    pub fn new(config: GeneratorConfig, grid: GridSpec, keys: K) -> Result<Self, GeneratorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::Service(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            config,
            grid,
            keys,
        })
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        )
    }

    fn call(
        &self,
        asset: AssetKind,
        params: &GenerationParams,
    ) -> Result<GenerateResponse, GeneratorError> {
        let model = match asset {
            AssetKind::Metadata => &self.config.text_model,
            _ => &self.config.image_model,
        };
        let key = self.keys.api_key()?;
        let body = build_request(asset, self.grid, params);
        debug!("requesting {asset} from {model}");

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .map_err(|e| GeneratorError::Service(format!("{asset} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            let detail: String = detail.chars().take(300).collect();
            return Err(GeneratorError::Service(format!(
                "{asset} request returned {status}: {detail}"
            )));
        }
        response
            .json::<GenerateResponse>()
            .map_err(|e| GeneratorError::Service(format!("{asset} response unreadable: {e}")))
    }

    fn image(&self, asset: AssetKind, params: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
        let response = self.call(asset, params)?;
        extract_image(&response, asset)
    }
}

impl<K: ApiKeyProvider> AssetGenerator for GeminiGenerator<K> {
    fn generate_composite(&self, params: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
        self.image(AssetKind::Composite, params)
    }

    fn generate_banner(&self, params: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
        self.image(AssetKind::Banner, params)
    }

    fn generate_logo(&self, params: &GenerationParams) -> Result<Vec<u8>, GeneratorError> {
        self.image(AssetKind::Logo, params)
    }

    fn generate_metadata(&self, params: &GenerationParams) -> Result<Metadata, GeneratorError> {
        let response = self.call(AssetKind::Metadata, params)?;
        extract_metadata(&response)
    }
}
