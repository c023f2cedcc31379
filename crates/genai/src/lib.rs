//! Remote video generation for slide decks.
//!
//! Wraps the generation and text-recognition capabilities behind traits,
//! drives long-running generations to completion, and assembles results.

pub mod api;
pub mod assembler;
pub mod classify;
pub mod client;
pub mod download;
pub mod keywords;
pub mod ocr;
pub mod orchestrator;

pub use api::{
    ContentGenerator, ContentRequest, GeneratedMedia, Operation, VideoGenerator, VideoRequest,
    DEFAULT_TEXT_MODEL, DEFAULT_VIDEO_MODEL,
};
pub use assembler::ResultAssembler;
pub use client::{ClientConfig, GeminiClient};
pub use download::{bundle_zip, media_file_name, MediaFetcher, BUNDLE_FILE_NAME};
pub use keywords::suggest_keywords;
pub use ocr::OcrEnricher;
pub use orchestrator::{GenerationOrchestrator, PollConfig};
