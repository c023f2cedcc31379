//! Genre keyword suggestions for cinematic-trailer prompts.

use deckreel_core::{Error, Genre, Result};

use crate::api::{ContentGenerator, ContentRequest};
use crate::classify;

/// Ask the text model for 5-7 keywords evoking `genre`.
///
/// Returns an empty string for [`Genre::None`] without calling out.
pub async fn suggest_keywords<C: ContentGenerator + ?Sized>(
    generator: &C,
    model: &str,
    genre: Genre,
) -> Result<String> {
    if genre == Genre::None {
        return Ok(String::new());
    }

    let request = ContentRequest {
        model: model.to_string(),
        prompt: format!(
            "Generate 5-7 creative and descriptive keywords for a video with a \"{}\" genre. \
Return only a comma-separated list. For example: \"keyword one, keyword two, keyword three\"",
            genre
        ),
        inline_image: None,
    };

    match generator.generate_content(&request).await {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => {
            let raw = e.to_string();
            let (kind, message) = classify::classify(&raw);
            log::error!("Error while generating keywords ({}): {}", kind, raw);
            Err(Error::RemoteRejected {
                kind,
                message: format!("AI keyword generation failed. {}", message),
            })
        }
    }
}
