//! Runs generation over a deck and collects the results in order.

use deckreel_core::{
    Progress, PromptComposer, Result, SelectionMap, SlideRecord, VideoResult,
};

use crate::api::VideoGenerator;
use crate::orchestrator::GenerationOrchestrator;

/// Accumulates [`VideoResult`]s as generations complete.
///
/// Results gathered before a failure stay available through
/// [`ResultAssembler::results`].
#[derive(Debug, Default)]
pub struct ResultAssembler {
    results: Vec<VideoResult>,
}

impl ResultAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[VideoResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<VideoResult> {
        self.results
    }

    /// Generate videos for `slides`, one clip per slide or a single combined
    /// video depending on the composer's transition setting.
    pub async fn run<G: VideoGenerator>(
        &mut self,
        orchestrator: &GenerationOrchestrator<G>,
        composer: &PromptComposer,
        slides: &[SlideRecord],
        selections: &SelectionMap,
        progress: &dyn Progress,
    ) -> Result<()> {
        self.results.clear();
        if composer.config().is_combined() {
            self.run_combined(orchestrator, composer, slides, selections, progress)
                .await
        } else {
            self.run_individual(orchestrator, composer, slides, selections, progress)
                .await
        }
    }

    /// One clip per slide, strictly in sequence. The first failure stops the batch.
    pub async fn run_individual<G: VideoGenerator>(
        &mut self,
        orchestrator: &GenerationOrchestrator<G>,
        composer: &PromptComposer,
        slides: &[SlideRecord],
        selections: &SelectionMap,
        progress: &dyn Progress,
    ) -> Result<()> {
        let total = slides.len();

        for slide in slides {
            progress.message(&format!(
                "Generating video for slide {} of {}...",
                slide.slide_number, total
            ));

            let prompt = composer.compose_single(slide, selections.resolve(slide));
            let context = format!("while generating video for slide {}", slide.slide_number);
            let media = orchestrator.submit_and_await(&prompt, &context).await?;

            self.results.push(VideoResult {
                slide_number: slide.slide_number,
                media_uri: media.media_uri,
                thumbnail_uri: media.thumbnail_uri,
                narration_text: slide.text.clone(),
                reference_image: prompt.seed_image,
            });
            progress.results(&self.results);
        }

        Ok(())
    }

    /// A single video spanning every slide.
    pub async fn run_combined<G: VideoGenerator>(
        &mut self,
        orchestrator: &GenerationOrchestrator<G>,
        composer: &PromptComposer,
        slides: &[SlideRecord],
        selections: &SelectionMap,
        progress: &dyn Progress,
    ) -> Result<()> {
        let transition = composer.config().transition;
        progress.message(&format!(
            "Generating single video with '{}' transitions...",
            transition
        ));

        let prompt = composer.compose_combined(slides, selections);
        if prompt.seed_image.is_some() {
            log::info!("Using an image from the presentation as a visual seed for the entire video.");
        }
        let media = orchestrator
            .submit_and_await(&prompt, "while generating the combined video")
            .await?;

        self.results.push(VideoResult {
            slide_number: 1,
            media_uri: media.media_uri,
            thumbnail_uri: media.thumbnail_uri,
            narration_text: format!(
                "Combined video of {} slides with '{}' transitions.",
                slides.len(),
                transition
            ),
            reference_image: prompt.seed_image,
        });
        progress.results(&self.results);

        Ok(())
    }
}
