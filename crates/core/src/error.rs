//! Error types for slide extraction and video generation.

use std::fmt;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a presentation into videos.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read a local file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input could not be opened as a compressed archive.
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    /// An archive entry exists but could not be read or parsed.
    #[error("Corrupt archive entry '{path}': {reason}")]
    CorruptEntry { path: String, reason: String },

    /// Extraction finished without a single slide carrying text or images.
    #[error("Could not find any slides with text or image content in the presentation.")]
    NoContentFound,

    /// A generation setting is out of range or could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No API key was found in the environment.
    #[error("API_KEY is not configured. Set GEMINI_API_KEY or API_KEY in the environment.")]
    MissingApiKey,

    /// The HTTP exchange with the remote service failed.
    #[error("{0}")]
    Transport(String),

    /// The remote operation finished but produced no usable video.
    #[error("Video generation failed: {0}")]
    GenerationFailed(String),

    /// Polling the remote operation failed too many times in a row.
    #[error("Polling for video status failed after {attempts} retries: {last_error}")]
    PollingExhausted { attempts: u32, last_error: String },

    /// The remote service refused the request; `message` is user-facing guidance.
    #[error("{message}")]
    RemoteRejected {
        kind: RejectionKind,
        message: String,
    },
}

impl Error {
    /// Build a [`Error::CorruptEntry`] for the given archive path.
    pub fn corrupt(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::CorruptEntry {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Category a remote failure was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Blocked by a content-safety policy.
    Safety,
    /// The request was malformed or carried an invalid argument.
    InvalidArgument,
    /// The service reported an internal (usually transient) error.
    Internal,
    /// Nothing recognizable; the raw message is surfaced.
    Unclassified,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Safety => "safety",
            Self::InvalidArgument => "invalid-argument",
            Self::Internal => "internal",
            Self::Unclassified => "unclassified",
        };
        f.write_str(label)
    }
}
