//! Natural-language prompt composition for video generation requests.
//!
//! The generator only accepts a prompt and an optional seed image, so every
//! setting it cannot take as a parameter (resolution tier, frame rate,
//! duration, transitions) is spelled out in the prompt text.

use std::fmt::Write as _;

use crate::config::{GenerationConfig, Genre};
use crate::types::{SelectionMap, SlideImage, SlideRecord};

/// Instruction prepended when a trailer-style intro is requested.
const TRAILER_INTRO: &str = "Start with a dramatic 5-10 second movie trailer intro. \
It should be a fast-paced montage with epic music, teasing the main themes. \
After the intro, the main video begins. ";

/// Prompt text plus the image the generation should be anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub seed_image: Option<SlideImage>,
}

/// Builds generation prompts from slides and a [`GenerationConfig`].
#[derive(Debug, Clone)]
pub struct PromptComposer {
    config: GenerationConfig,
}

impl PromptComposer {
    /// Create a composer for the given settings.
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Compose the prompt for a single slide's clip.
    pub fn compose_single(&self, slide: &SlideRecord, selected_image: Option<&SlideImage>) -> Prompt {
        let config = &self.config;
        self.log_quality_notice();

        let mut text = String::new();
        if config.is_cinematic_trailer() {
            text.push_str(self.intro());
            let _ = write!(
                text,
                "Cinematic video about: \"{}\". Style: {}. {} The video should be approximately {} seconds long.",
                slide.text,
                config.style,
                self.format_settings(),
                config.duration_secs
            );
            self.push_trailer_details(&mut text);
        } else {
            let _ = write!(
                text,
                "Video about: \"{}\". Style: {}. {} The video should be approximately {} seconds long.",
                slide.text,
                config.style,
                self.format_settings(),
                config.duration_secs
            );
        }

        if config.voiceover && !slide.text.trim().is_empty() {
            text.push_str(" Include a clear voiceover narrating the text.");
        }

        Prompt {
            text,
            seed_image: selected_image.cloned(),
        }
    }

    /// Compose the prompt for one video spanning all slides.
    ///
    /// The seed image is the selected image of the lowest-numbered slide
    /// whose selection resolves to an image.
    pub fn compose_combined(&self, slides: &[SlideRecord], selections: &SelectionMap) -> Prompt {
        let config = &self.config;
        self.log_quality_notice();

        let mut ordered: Vec<&SlideRecord> = slides.iter().collect();
        ordered.sort_by_key(|s| s.slide_number);

        let seed_image = ordered
            .iter()
            .find_map(|slide| selections.resolve(slide))
            .cloned();

        let mut text = String::new();
        text.push_str(self.intro());
        let _ = write!(
            text,
            "A single continuous video. Style: {}. {} Total duration should be approximately {} seconds. \
Transition between scenes: {}.",
            config.style,
            self.format_settings(),
            config.duration_secs,
            config.transition.label().to_lowercase()
        );
        if config.is_cinematic_trailer() {
            self.push_trailer_details(&mut text);
        }

        text.push_str("\nThe video should tell a cohesive story across all scenes.\n");
        if config.voiceover {
            text.push_str(
                "Include a single, continuous voiceover narrating the story. Here is the script for each scene:\n",
            );
        } else {
            text.push_str("Here are the scenes:\n");
        }

        for (index, slide) in ordered.iter().enumerate() {
            if !slide.text.trim().is_empty() {
                let _ = writeln!(text, "- Scene {}: \"{}\"", index + 1, slide.text);
            }
        }

        Prompt { text, seed_image }
    }

    /// Aspect ratio, frame rate and resolution tier as prompt sentences.
    fn format_settings(&self) -> String {
        format!(
            "Aspect ratio: {}. Frame rate: {}. Resolution: {}.",
            self.config.aspect_ratio, self.config.frame_rate, self.config.quality
        )
    }

    fn intro(&self) -> &'static str {
        if self.config.intro && self.config.is_cinematic_trailer() {
            TRAILER_INTRO
        } else {
            ""
        }
    }

    /// Genre and keywords, which only the cinematic-trailer template carries.
    fn push_trailer_details(&self, text: &mut String) {
        if self.config.genre != Genre::None {
            let _ = write!(text, " Genre: {}.", self.config.genre);
        }
        let keywords = self.config.keywords.trim();
        if !keywords.is_empty() {
            let _ = write!(text, " Keywords: {}.", keywords);
        }
    }

    fn log_quality_notice(&self) {
        log::info!(
            "Video quality setting \"{}\" cannot be passed to the generator as a parameter; \
it is only requested in the prompt text",
            self.config.quality
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Transition, VideoStyle};

    fn slide(number: usize, text: &str, images: usize) -> SlideRecord {
        let mut slide = SlideRecord::new(number);
        slide.text = text.to_string();
        for i in 0..images {
            slide.push_image(SlideImage::new(format!("s{}i{}", number, i), "image/png"));
        }
        slide
    }

    fn trailer() -> GenerationConfig {
        GenerationConfig::new().with_style(VideoStyle::Hollywood)
    }

    #[test]
    fn test_single_default_template() {
        let composer = PromptComposer::new(GenerationConfig::new().with_voiceover(false));
        let prompt = composer.compose_single(&slide(1, "Quarterly results", 0), None);

        assert!(prompt.text.starts_with("Video about: \"Quarterly results\". Style: Default."));
        assert!(prompt.text.contains("Aspect ratio: 16:9."));
        assert!(prompt.text.contains("Frame rate: 30fps."));
        assert!(prompt.text.contains("Resolution: 720p."));
        assert!(prompt.text.contains("approximately 15 seconds"));
        assert!(!prompt.text.contains("voiceover"));
        assert!(prompt.seed_image.is_none());
    }

    #[test]
    fn test_single_carries_selected_image() {
        let s = slide(2, "Roadmap", 2);
        let composer = PromptComposer::new(GenerationConfig::new());
        let prompt = composer.compose_single(&s, s.images.get(1));
        assert_eq!(prompt.seed_image.as_ref(), Some(&s.images[1]));
    }

    #[test]
    fn test_single_voiceover_requires_text() {
        let composer = PromptComposer::new(GenerationConfig::new().with_voiceover(true));
        let with_text = composer.compose_single(&slide(1, "Hello", 0), None);
        let blank = composer.compose_single(&slide(2, "  ", 1), None);

        assert!(with_text.text.ends_with("Include a clear voiceover narrating the text."));
        assert!(!blank.text.contains("voiceover"));
    }

    #[test]
    fn test_single_trailer_template() {
        let config = trailer()
            .with_genre(Genre::Thriller)
            .with_keywords("  neon, rain ")
            .with_intro(true)
            .with_voiceover(false);
        let prompt = PromptComposer::new(config).compose_single(&slide(1, "Launch", 0), None);

        assert!(prompt.text.starts_with("Start with a dramatic 5-10 second movie trailer intro."));
        assert!(prompt.text.contains("Cinematic video about: \"Launch\". Style: Hollywood."));
        assert!(prompt.text.contains(" Genre: Thriller."));
        assert!(prompt.text.contains(" Keywords: neon, rain."));
    }

    #[test]
    fn test_trailer_omits_none_genre_and_blank_keywords() {
        let config = trailer().with_keywords("   ");
        let prompt = PromptComposer::new(config).compose_single(&slide(1, "Launch", 0), None);

        assert!(!prompt.text.contains("Genre:"));
        assert!(!prompt.text.contains("Keywords:"));
        assert!(!prompt.text.contains("trailer intro"));
    }

    #[test]
    fn test_intro_ignored_outside_trailer_style() {
        let config = GenerationConfig::new()
            .with_style(VideoStyle::Documentary)
            .with_intro(true)
            .with_genre(Genre::Action);
        let prompt = PromptComposer::new(config).compose_single(&slide(1, "Launch", 0), None);

        assert!(prompt.text.starts_with("Video about:"));
        assert!(!prompt.text.contains("Genre:"));
    }

    #[test]
    fn test_combined_seed_is_first_selected_slide() {
        let slides = vec![slide(1, "Intro", 0), slide(2, "Middle", 1), slide(3, "End", 1)];
        let selections = SelectionMap::defaults_for(&slides);
        let composer = PromptComposer::new(GenerationConfig::new().with_transition(Transition::Fade));

        let prompt = composer.compose_combined(&slides, &selections);
        assert_eq!(prompt.seed_image.as_ref(), Some(&slides[1].images[0]));
    }

    #[test]
    fn test_combined_seed_skips_out_of_range_selection() {
        let slides = vec![slide(1, "A", 1), slide(2, "B", 1)];
        let mut selections = SelectionMap::defaults_for(&slides);
        selections.select(1, 9);
        let composer = PromptComposer::new(GenerationConfig::new().with_transition(Transition::Zoom));

        let prompt = composer.compose_combined(&slides, &selections);
        assert_eq!(prompt.seed_image.as_ref(), Some(&slides[1].images[0]));
    }

    #[test]
    fn test_combined_scene_lines() {
        let slides = vec![slide(1, "Opening", 0), slide(2, "", 1), slide(3, "Closing", 0)];
        let config = GenerationConfig::new().with_transition(Transition::Slide);
        let prompt = PromptComposer::new(config).compose_combined(&slides, &SelectionMap::new());

        assert!(prompt.text.contains("Transition between scenes: slide."));
        assert!(prompt.text.contains("Here is the script for each scene:\n"));
        assert!(prompt.text.contains("- Scene 1: \"Opening\"\n"));
        assert!(prompt.text.contains("- Scene 3: \"Closing\"\n"));
        assert!(!prompt.text.contains("Scene 2"));
        assert!(prompt.seed_image.is_none());
    }

    #[test]
    fn test_combined_without_voiceover() {
        let slides = vec![slide(1, "Only", 0)];
        let config = trailer()
            .with_transition(Transition::Fade)
            .with_voiceover(false)
            .with_genre(Genre::Drama);
        let prompt = PromptComposer::new(config).compose_combined(&slides, &SelectionMap::new());

        assert!(prompt.text.contains("Style: Hollywood."));
        assert!(prompt.text.contains("Genre: Drama."));
        assert!(prompt.text.contains("Here are the scenes:\n"));
        assert!(!prompt.text.contains("voiceover"));
    }
}
