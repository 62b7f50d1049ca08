//! Gemini `generateContent` client and wire types.

use std::future::Future;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::NanobananaError;

/// Output resolution requested from the model.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ImageSize {
    /// About 1024px on the long edge
    #[default]
    #[value(name = "1K")]
    OneK,
    /// About 2048px
    #[value(name = "2K")]
    TwoK,
    /// About 4096px
    #[value(name = "4K")]
    FourK,
}

impl ImageSize {
    /// The API's spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image loaded from disk, checked to be decodable.
#[derive(Clone, Debug)]
pub struct InputImage {
    /// Where it came from
    pub path: PathBuf,
    /// eg `image/png`
    pub mime_type: String,
    /// The file contents, sent unchanged
    pub bytes: Vec<u8>,
}

impl InputImage {
    /// Reads and decodes `path`. Fails if the contents are not an image.
    pub fn load(path: &Path) -> Result<Self, NanobananaError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path.to_path_buf(), bytes)
    }

    /// Validates in-memory bytes as an image.
    pub fn from_bytes(path: PathBuf, bytes: Vec<u8>) -> Result<Self, NanobananaError> {
        let reader = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|err| NanobananaError::ImageDecode(format!("{}: {err}", path.display())))?;
        let format = reader.format().ok_or_else(|| {
            NanobananaError::ImageDecode(format!("{}: unrecognised image format", path.display()))
        })?;
        reader
            .decode()
            .map_err(|err| NanobananaError::ImageDecode(format!("{}: {err}", path.display())))?;
        Ok(Self {
            path,
            mime_type: format.to_mime_type().to_string(),
            bytes,
        })
    }
}

/// One call's worth of input.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Instruction text, always sent first
    pub prompt: String,
    /// Images sent after the prompt, in order
    pub images: Vec<InputImage>,
    /// Requested resolution
    pub size: ImageSize,
}

/// Something that turns a [`GenerationRequest`] into response parts.
pub trait ImageService {
    /// Sends one request; never retried.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerateContentResponse, NanobananaError>> + Send;
}

/// Talks to the Gemini REST API.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    /// Builds a client from the startup config.
    pub fn new(config: &Config) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Same as [`GeminiClient::new`] with a preconfigured HTTP client.
    pub fn with_http_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl ImageService for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model, size = %request.size))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerateContentResponse, NanobananaError> {
        let body = GenerateContentRequest::from(request);
        debug!(
            "Sending prompt with {} image(s) to {}",
            request.images.len(),
            self.endpoint()
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(NanobananaError::Api {
                status: status.as_u16(),
                body: api_error_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|err| {
            NanobananaError::Request(format!("Failed to parse Gemini response: {err}"))
        })
    }
}

/// Pulls `error.message` out of a Gemini error body, or returns the body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

// -----------------------------
// Request
// -----------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    image_size: &'static str,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let mut parts = vec![RequestPart::Text {
            text: request.prompt.clone(),
        }];
        parts.extend(request.images.iter().map(|image| RequestPart::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: general_purpose::STANDARD.encode(&image.bytes),
            },
        }));

        Self {
            contents: vec![RequestContent {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
                image_config: ImageConfig {
                    image_size: request.size.as_str(),
                },
            },
        }
    }
}

// -----------------------------
// Response
// -----------------------------

/// Base64 payload with its MIME type.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// eg `image/png`
    #[serde(default)]
    pub mime_type: String,
    /// Standard base64
    pub data: String,
}

impl Blob {
    /// Decodes the payload.
    pub fn decode(&self) -> Result<Vec<u8>, NanobananaError> {
        general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|err| NanobananaError::ImageDecode(format!("bad base64 in response: {err}")))
    }
}

/// One piece of model output.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Commentary from the model
    Text {
        /// The text
        text: String,
    },
    /// Image bytes embedded in the response
    InlineData {
        /// The payload
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    /// Anything else (eg bare thought signatures), ignored
    Other(Value),
}

/// Top level of a `generateContent` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate answers; only the first is used
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Present when the prompt itself was rejected
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A candidate answer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Missing when generation stopped early
    #[serde(default)]
    pub content: Option<CandidateContent>,
    /// eg `STOP`, `IMAGE_SAFETY`
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The parts of a candidate.
#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    /// In model order
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Why a prompt was refused.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// eg `SAFETY`
    #[serde(default)]
    pub block_reason: Option<String>,
    /// Human readable explanation
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

impl GenerateContentResponse {
    /// Builds a response holding a single candidate with `parts`.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(CandidateContent { parts }),
                finish_reason: Some("STOP".to_string()),
            }],
            prompt_feedback: None,
        }
    }

    /// The first candidate's parts, or the block reason if the prompt was
    /// refused.
    pub fn into_parts(self) -> Result<Vec<Part>, NanobananaError> {
        if let Some(feedback) = self.prompt_feedback
            && let Some(reason) = feedback.block_reason
        {
            return Err(NanobananaError::Blocked(
                feedback.block_reason_message.unwrap_or(reason),
            ));
        }
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(Vec::new());
        };
        if let Some(reason) = &candidate.finish_reason {
            debug!("Finish reason: {}", reason);
        }
        Ok(candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default())
    }
}
