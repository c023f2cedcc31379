//! Best-effort text recognition for slide images.
//!
//! Recognition never fails the pipeline: an image whose request fails
//! contributes an empty string, and the failure is only logged.

use deckreel_core::{Progress, Result, SlideImage, SlideRecord};
use futures::future::join_all;

use crate::api::{ContentGenerator, ContentRequest, DEFAULT_TEXT_MODEL};

/// Instruction sent along with each image.
pub const OCR_PROMPT: &str =
    "Extract all text from this image. If no text is present, return an empty string.";

/// Appends text recognized in a slide's images to the slide's narration.
pub struct OcrEnricher<C> {
    generator: C,
    model: String,
}

impl<C: ContentGenerator> OcrEnricher<C> {
    pub fn new(generator: C) -> Self {
        Self {
            generator,
            model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Recognize the text in one image.
    pub async fn recognize(&self, image: &SlideImage) -> Result<String> {
        let request = ContentRequest {
            model: self.model.clone(),
            prompt: OCR_PROMPT.to_string(),
            inline_image: Some(image.clone()),
        };
        let text = self.generator.generate_content(&request).await?;
        Ok(text.trim().to_string())
    }

    /// Like [`OcrEnricher::recognize`], but a failure yields an empty string.
    pub async fn recognize_or_empty(&self, image: &SlideImage) -> String {
        match self.recognize(image).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Text recognition failed, continuing without it: {}", e);
                String::new()
            }
        }
    }

    /// Run recognition over every image of every slide.
    pub async fn enrich(&self, slides: Vec<SlideRecord>, progress: &dyn Progress) -> Vec<SlideRecord> {
        let mut slides = slides;
        for slide in slides.iter_mut().filter(|s| !s.images.is_empty()) {
            progress.message(&format!(
                "Reading text from {} image(s) on slide {}...",
                slide.images.len(),
                slide.slide_number
            ));

            let texts = join_all(slide.images.iter().map(|image| self.recognize_or_empty(image))).await;
            let recognized = texts
                .into_iter()
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            if !recognized.is_empty() {
                log::debug!("Slide {}: recognized {:?}", slide.slide_number, recognized);
            }
            slide.append_text(&recognized);
        }
        slides
    }
}
