//! HTTP client for the Gemini API.
//!
//! Implements [`VideoGenerator`] on top of the `predictLongRunning` and
//! operations endpoints, and [`ContentGenerator`] on top of
//! `generateContent`, using [`reqwest`].

use async_trait::async_trait;
use deckreel_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::{
    ContentGenerator, ContentRequest, GeneratedVideo, GenerationResponse, Operation,
    OperationError, VideoGenerator, VideoRef, VideoRequest,
};

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Connection settings for [`GeminiClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ClientConfig {
    /// Settings for the public endpoint with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the API key from the first non-empty variable in [`API_KEY_VARS`].
    pub fn from_env() -> Result<Self> {
        API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .map(|key| Self::new(key.trim()))
            .ok_or(Error::MissingApiKey)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// HTTP client for the generation and content endpoints.
pub struct GeminiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl GeminiClient {
    /// Create a client with its own connection pool.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// URL of a model method, e.g. `.../models/veo-2.0-generate-001:predictLongRunning`.
    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(request_failed)?;

        Self::parse_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(request_failed)?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Turn a non-2xx response into [`Error::Transport`], keeping the
    /// service's own error message and status for classification.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let detail = match serde_json::from_str::<WireErrorBody>(&body) {
            Ok(WireErrorBody { error }) => match error.status {
                Some(code) => format!("{} ({})", error.message, code),
                None => error.message,
            },
            Err(_) => body,
        };

        Err(Error::Transport(format!(
            "API error ({}): {}",
            status.as_u16(),
            detail
        )))
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Transport(format!("Failed to decode API response: {}", e)))
    }
}

fn request_failed(e: reqwest::Error) -> Error {
    Error::Transport(format!("HTTP request failed: {}", e))
}

#[async_trait]
impl VideoGenerator for GeminiClient {
    async fn submit(&self, request: &VideoRequest) -> Result<Operation> {
        let body = PredictRequest::from(request);
        let url = self.model_url(&request.model, "predictLongRunning");
        log::debug!("Submitting video generation to {}", url);

        let operation: WireOperation = self.post_json(&url, &body).await?;
        Ok(operation.into())
    }

    async fn poll(&self, operation: &Operation) -> Result<Operation> {
        let url = format!("{}/{}", self.config.base_url, operation.name);
        let operation: WireOperation = self.get_json(&url).await?;
        Ok(operation.into())
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_content(&self, request: &ContentRequest) -> Result<String> {
        let mut parts = vec![WirePart::Text {
            text: &request.prompt,
        }];
        if let Some(image) = &request.inline_image {
            parts.push(WirePart::InlineData {
                inline_data: WireBlob {
                    mime_type: &image.mime_type,
                    data: &image.base64,
                },
            });
        }
        let body = GenerateContentRequest {
            contents: vec![WireContent { parts }],
        };

        let url = self.model_url(&request.model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &body).await?;
        Ok(response.text())
    }
}

// ---- wire formats ----

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters,
}

impl<'a> From<&'a VideoRequest> for PredictRequest<'a> {
    fn from(request: &'a VideoRequest) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: &request.prompt,
                image: request.image.as_ref().map(|image| WireImage {
                    bytes_base64_encoded: &image.base64,
                    mime_type: &image.mime_type,
                }),
            }],
            parameters: PredictParameters {
                sample_count: request.count,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<WireImage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireImage<'a> {
    bytes_base64_encoded: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOperation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<WireOperationResponse>,
    #[serde(default)]
    error: Option<WireStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOperationResponse {
    #[serde(default)]
    generate_video_response: Option<WireVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVideoResponse {
    #[serde(default)]
    generated_samples: Vec<WireSample>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireSample {
    #[serde(default)]
    video: Option<WireVideo>,
}

#[derive(Debug, Deserialize)]
struct WireVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireStatus,
}

impl From<WireOperation> for Operation {
    fn from(wire: WireOperation) -> Self {
        let video_response = wire.response.and_then(|r| r.generate_video_response);

        let mut error = wire.error.map(|status| OperationError {
            code: status.code,
            message: status.message,
        });

        let response = video_response.map(|r| {
            if r.generated_samples.is_empty() && !r.rai_media_filtered_reasons.is_empty() && error.is_none() {
                error = Some(OperationError {
                    code: None,
                    message: format!(
                        "Video was filtered by safety checks: {}",
                        r.rai_media_filtered_reasons.join("; ")
                    ),
                });
            }
            GenerationResponse {
                generated_videos: r
                    .generated_samples
                    .into_iter()
                    .map(|sample| GeneratedVideo {
                        video: sample.video.map(|v| VideoRef { uri: v.uri }),
                    })
                    .collect(),
            }
        });

        Operation {
            name: wire.name,
            done: wire.done,
            response,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<WireContent<'a>>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireTextPart>,
}

#[derive(Debug, Deserialize)]
struct WireTextPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated and trimmed.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}
