//! Rewrites raw remote failures into user-actionable messages.

use std::sync::LazyLock;

use deckreel_core::{Error, RejectionKind};
use regex::Regex;

static SAFETY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)safety").unwrap());

static INVALID_ARGUMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)invalid[ _]argument").unwrap());

static INTERNAL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)internal").unwrap());

/// Classify a raw failure message and produce the text shown to the user.
///
/// Unrecognized messages are passed through unchanged.
pub fn classify(raw: &str) -> (RejectionKind, String) {
    if SAFETY_REGEX.is_match(raw) {
        (
            RejectionKind::Safety,
            "The prompt was blocked due to a safety policy. Please modify the slide text or keywords."
                .to_string(),
        )
    } else if INVALID_ARGUMENT_REGEX.is_match(raw) {
        (
            RejectionKind::InvalidArgument,
            format!("The request was invalid. The API reported: {}", raw),
        )
    } else if INTERNAL_REGEX.is_match(raw) {
        (
            RejectionKind::Internal,
            "An internal server error occurred with the API. Please try again later.".to_string(),
        )
    } else {
        (RejectionKind::Unclassified, raw.to_string())
    }
}

/// Log the raw failure and turn it into [`Error::RemoteRejected`].
///
/// `context` reads like "while generating video for slide 3".
pub fn rejection(raw: &str, context: &str) -> Error {
    let (kind, message) = classify(raw);
    log::error!("Error {} ({}): {}", context, kind, raw);
    Error::RemoteRejected { kind, message }
}
