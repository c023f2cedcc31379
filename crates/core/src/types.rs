//! Domain types for extracted slides and generated videos.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// An image embedded in (or supplied for) a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideImage {
    /// Image bytes, base64 encoded.
    pub base64: String,

    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
}

impl SlideImage {
    /// Create an image from already-encoded data.
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Create an image by base64-encoding raw bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(STANDARD.encode(bytes), mime_type)
    }
}

/// Infer an image MIME type from a file path's extension.
///
/// Only JPEG and PNG are recognized; anything else is treated as PNG.
pub fn mime_type_for_path(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        _ => "image/png",
    }
}

/// Structured content of a single slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideRecord {
    /// 1-based position of the slide in the archive.
    pub slide_number: usize,

    /// Narration text (trimmed text runs, plus any recognized image text).
    pub text: String,

    /// Images in the order they are referenced by the slide markup.
    pub images: Vec<SlideImage>,

    /// Optional thumbnail rendered by the authoring application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<SlideImage>,
}

impl SlideRecord {
    /// Create an empty record for the given slide number.
    pub fn new(slide_number: usize) -> Self {
        Self {
            slide_number,
            text: String::new(),
            images: Vec::new(),
            thumbnail: None,
        }
    }

    /// Whether the slide carries any text or image content.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || !self.images.is_empty()
    }

    /// Append an image and return its index. Existing entries are untouched.
    pub fn push_image(&mut self, image: SlideImage) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    /// Append recognized text, separated from existing text by a space.
    ///
    /// Blank input leaves the text unchanged.
    pub fn append_text(&mut self, extra: &str) {
        let extra = extra.trim();
        if extra.is_empty() {
            return;
        }
        if self.text.is_empty() {
            self.text.push_str(extra);
        } else {
            self.text.push(' ');
            self.text.push_str(extra);
        }
    }
}

/// Which image of each slide is used as the seed for generation.
///
/// Keys are slide numbers, values are zero-based indexes into that slide's
/// images. An index is only dereferenced through [`SelectionMap::resolve`],
/// which treats out-of-range indexes as no selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionMap {
    selections: BTreeMap<usize, usize>,
}

impl SelectionMap {
    /// Create an empty selection map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the first image of every slide that has at least one.
    pub fn defaults_for(slides: &[SlideRecord]) -> Self {
        let selections = slides
            .iter()
            .filter(|s| !s.images.is_empty())
            .map(|s| (s.slide_number, 0))
            .collect();
        Self { selections }
    }

    /// Record a selection for a slide, replacing any previous one.
    pub fn select(&mut self, slide_number: usize, index: usize) {
        self.selections.insert(slide_number, index);
    }

    /// The raw selected index for a slide, if any.
    pub fn get(&self, slide_number: usize) -> Option<usize> {
        self.selections.get(&slide_number).copied()
    }

    /// The selected image of a slide, if the selection is present and in bounds.
    pub fn resolve<'a>(&self, slide: &'a SlideRecord) -> Option<&'a SlideImage> {
        self.get(slide.slide_number)
            .and_then(|idx| slide.images.get(idx))
    }
}

/// A finished generation, ready for presentation or download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    /// Slide the video belongs to (1 for a combined video).
    pub slide_number: usize,

    /// Location of the generated media.
    pub media_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_uri: Option<String>,

    /// Text the video narrates or describes.
    pub narration_text: String,

    /// Image the generation was seeded with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<SlideImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide_with_images(number: usize, count: usize) -> SlideRecord {
        let mut slide = SlideRecord::new(number);
        for i in 0..count {
            slide.push_image(SlideImage::new(format!("img{}", i), "image/png"));
        }
        slide
    }

    #[test]
    fn test_mime_type_for_path() {
        assert_eq!(mime_type_for_path("ppt/media/image1.jpg"), "image/jpeg");
        assert_eq!(mime_type_for_path("ppt/media/image1.JPEG"), "image/jpeg");
        assert_eq!(mime_type_for_path("ppt/media/image2.png"), "image/png");
        assert_eq!(mime_type_for_path("ppt/media/image3.emf"), "image/png");
        assert_eq!(mime_type_for_path("noextension"), "image/png");
    }

    #[test]
    fn test_from_bytes_encodes_base64() {
        let image = SlideImage::from_bytes(b"abc", "image/png");
        assert_eq!(image.base64, "YWJj");
    }

    #[test]
    fn test_has_content() {
        let mut slide = SlideRecord::new(1);
        assert!(!slide.has_content());
        slide.text = "   ".to_string();
        assert!(!slide.has_content());
        slide.push_image(SlideImage::new("x", "image/png"));
        assert!(slide.has_content());
    }

    #[test]
    fn test_append_text() {
        let mut slide = SlideRecord::new(1);
        slide.append_text("");
        assert_eq!(slide.text, "");
        slide.append_text("Recognized");
        assert_eq!(slide.text, "Recognized");

        let mut slide = SlideRecord::new(2);
        slide.text = "Hello".to_string();
        slide.append_text("  ");
        assert_eq!(slide.text, "Hello");
        slide.append_text("world");
        assert_eq!(slide.text, "Hello world");
    }

    #[test]
    fn test_push_image_returns_new_index() {
        let mut slide = slide_with_images(1, 2);
        let first = slide.images[0].clone();
        let idx = slide.push_image(SlideImage::new("user", "image/jpeg"));
        assert_eq!(idx, 2);
        assert_eq!(slide.images[0], first);
    }

    #[test]
    fn test_selection_defaults() {
        let slides = vec![
            slide_with_images(1, 0),
            slide_with_images(2, 3),
            slide_with_images(4, 1),
        ];
        let selections = SelectionMap::defaults_for(&slides);
        assert_eq!(selections.get(1), None);
        assert_eq!(selections.get(2), Some(0));
        assert_eq!(selections.get(4), Some(0));
    }

    #[test]
    fn test_resolve_out_of_bounds_is_absent() {
        let slide = slide_with_images(3, 1);
        let mut selections = SelectionMap::new();
        selections.select(3, 5);
        assert!(selections.resolve(&slide).is_none());

        selections.select(3, 0);
        assert_eq!(selections.resolve(&slide), Some(&slide.images[0]));
    }

    #[test]
    fn test_slide_record_serializes_camel_case() {
        let slide = slide_with_images(7, 1);
        let json = serde_json::to_value(&slide).unwrap();
        assert_eq!(json["slideNumber"], 7);
        assert_eq!(json["images"][0]["mimeType"], "image/png");
        assert!(json.get("thumbnail").is_none());
    }
}
