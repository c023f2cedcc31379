//! Core domain types, generation settings, and prompt composition
//! for turning presentation slides into generated videos.

pub mod config;
pub mod error;
pub mod progress;
pub mod prompt;
pub mod types;

pub use config::{
    AspectRatio, FrameRate, GenerationConfig, Genre, Transition, VideoQuality, VideoStyle,
};
pub use error::{Error, RejectionKind, Result};
pub use progress::{NoProgress, Progress};
pub use prompt::{Prompt, PromptComposer};
pub use types::{mime_type_for_path, SelectionMap, SlideImage, SlideRecord, VideoResult};
