//! Contracts for the remote generation and text-recognition capabilities.
//!
//! The traits here are the seam between the pipeline and the network: the
//! HTTP implementation lives in [`crate::client`], tests substitute fakes.

use async_trait::async_trait;
use deckreel_core::{Result, SlideImage};
use serde::{Deserialize, Serialize};

/// Video model used when none is configured.
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Text model used for recognition and keyword suggestions.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// A request to start a video generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub model: String,
    pub prompt: String,
    /// Optional seed image anchoring the video's look.
    pub image: Option<SlideImage>,
    /// Number of videos to generate; always 1 for this pipeline.
    pub count: u32,
}

/// State of a long-running generation operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Handle used to poll the operation.
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<GenerationResponse>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl Operation {
    /// The URI of the first generated video, if there is one.
    pub fn first_video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generated_videos
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(default)]
    pub generated_videos: Vec<GeneratedVideo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(default)]
    pub uri: Option<String>,
}

/// Failure status reported inside a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// A prompt, optionally with one inline image, for the text model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub model: String,
    pub prompt: String,
    pub inline_image: Option<SlideImage>,
}

/// Where a finished generation can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMedia {
    pub media_uri: String,
    pub thumbnail_uri: Option<String>,
}

/// Starts and polls long-running video generations.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Submit a generation request and return the operation handle.
    async fn submit(&self, request: &VideoRequest) -> Result<Operation>;

    /// Fetch the current state of an operation.
    async fn poll(&self, operation: &Operation) -> Result<Operation>;
}

/// Answers a prompt (optionally about an image) with free text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, request: &ContentRequest) -> Result<String>;
}

#[async_trait]
impl<T: VideoGenerator + ?Sized> VideoGenerator for std::sync::Arc<T> {
    async fn submit(&self, request: &VideoRequest) -> Result<Operation> {
        (**self).submit(request).await
    }

    async fn poll(&self, operation: &Operation) -> Result<Operation> {
        (**self).poll(operation).await
    }
}

#[async_trait]
impl<T: ContentGenerator + ?Sized> ContentGenerator for std::sync::Arc<T> {
    async fn generate_content(&self, request: &ContentRequest) -> Result<String> {
        (**self).generate_content(request).await
    }
}
