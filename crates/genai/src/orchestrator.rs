//! Submits generation requests and polls them to completion.

use std::time::Duration;

use deckreel_core::{Error, Prompt, Result};

use crate::api::{GeneratedMedia, Operation, VideoGenerator, VideoRequest, DEFAULT_VIDEO_MODEL};
use crate::classify;

/// Polling cadence and fault tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before each poll.
    pub interval: Duration,
    /// Consecutive failed polls tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_consecutive_failures: 5,
        }
    }
}

/// Drives one generation from submission to a media reference.
///
/// ```text
/// SUBMITTED -> poll ... poll -> DONE
///                   \-> failure x N -> PollingExhausted
/// ```
///
/// A failed poll only counts against the limit until the next successful
/// poll, which resets the counter.
pub struct GenerationOrchestrator<G> {
    generator: G,
    model: String,
    poll: PollConfig,
}

impl<G: VideoGenerator> GenerationOrchestrator<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            model: DEFAULT_VIDEO_MODEL.to_string(),
            poll: PollConfig::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Submit `prompt` and wait until the operation finishes.
    ///
    /// `context` describes the request for logs and error messages, e.g.
    /// "while generating video for slide 2".
    pub async fn submit_and_await(&self, prompt: &Prompt, context: &str) -> Result<GeneratedMedia> {
        let request = VideoRequest {
            model: self.model.clone(),
            prompt: prompt.text.clone(),
            image: prompt.seed_image.clone(),
            count: 1,
        };
        log::debug!("Prompt {}: {}", context, request.prompt);

        let operation = self
            .generator
            .submit(&request)
            .await
            .map_err(|e| classify::rejection(&e.to_string(), context))?;
        log::info!("Submitted generation operation {}", operation.name);

        let finished = self.await_completion(operation, context).await?;

        match finished.first_video_uri() {
            Some(uri) => Ok(GeneratedMedia {
                media_uri: uri.to_string(),
                thumbnail_uri: None,
            }),
            None => {
                let reason = match &finished.error {
                    Some(error) => {
                        log::error!("Error {}: {}", context, error.message);
                        classify::classify(&error.message).1
                    }
                    None => "API operation completed without providing a video link.".to_string(),
                };
                Err(Error::GenerationFailed(reason))
            }
        }
    }

    /// Poll until `done`, tolerating up to the configured run of failures.
    ///
    /// When the run is exhausted the last failure is logged raw and surfaced
    /// in its classified form.
    async fn await_completion(&self, operation: Operation, context: &str) -> Result<Operation> {
        let max_failures = self.poll.max_consecutive_failures.max(1);
        let mut current = operation;
        let mut failures = 0u32;

        while !current.done {
            tokio::time::sleep(self.poll.interval).await;

            match self.generator.poll(&current).await {
                Ok(next) => {
                    current = next;
                    failures = 0;
                }
                Err(e) => {
                    failures += 1;
                    log::warn!(
                        "Polling operation {} failed ({}/{}), retrying: {}",
                        current.name,
                        failures,
                        max_failures,
                        e
                    );
                    if failures >= max_failures {
                        let raw = e.to_string();
                        log::error!("Error {}: {}", context, raw);
                        return Err(Error::PollingExhausted {
                            attempts: failures,
                            last_error: classify::classify(&raw).1,
                        });
                    }
                }
            }
        }

        Ok(current)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{GeneratedVideo, GenerationResponse, OperationError, VideoRef};
    use async_trait::async_trait;
    use deckreel_core::{RejectionKind, SlideImage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted generator: every submit returns a pending operation, polls
    /// pop from a shared queue.
    #[derive(Default)]
    pub(crate) struct FakeGenerator {
        pub submit_error: Mutex<Option<String>>,
        pub polls: Mutex<VecDeque<Result<Operation>>>,
        pub requests: Mutex<Vec<VideoRequest>>,
        pub poll_count: Mutex<u32>,
    }

    impl FakeGenerator {
        pub fn push_poll(&self, result: Result<Operation>) {
            self.polls.lock().unwrap().push_back(result);
        }

        pub fn push_failures(&self, count: usize) {
            for i in 0..count {
                self.push_poll(Err(Error::Transport(format!("connection reset #{}", i))));
            }
        }
    }

    #[async_trait]
    impl VideoGenerator for FakeGenerator {
        async fn submit(&self, request: &VideoRequest) -> Result<Operation> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(message) = self.submit_error.lock().unwrap().take() {
                return Err(Error::Transport(message));
            }
            Ok(pending("operations/test"))
        }

        async fn poll(&self, _operation: &Operation) -> Result<Operation> {
            *self.poll_count.lock().unwrap() += 1;
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Transport("no scripted poll left".to_string())))
        }
    }

    pub(crate) fn pending(name: &str) -> Operation {
        Operation {
            name: name.to_string(),
            ..Operation::default()
        }
    }

    pub(crate) fn finished(uri: &str) -> Operation {
        Operation {
            name: "operations/test".to_string(),
            done: true,
            response: Some(GenerationResponse {
                generated_videos: vec![GeneratedVideo {
                    video: Some(VideoRef {
                        uri: Some(uri.to_string()),
                    }),
                }],
            }),
            error: None,
        }
    }

    pub(crate) fn fast_poll() -> PollConfig {
        PollConfig {
            interval: Duration::ZERO,
            max_consecutive_failures: 5,
        }
    }

    fn prompt(text: &str) -> Prompt {
        Prompt {
            text: text.to_string(),
            seed_image: None,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_polling() {
        let fake = FakeGenerator::default();
        fake.push_poll(Ok(pending("operations/test")));
        fake.push_poll(Ok(finished("https://media/video.mp4")));
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let media = orchestrator.submit_and_await(&prompt("hello"), "in test").await.unwrap();
        assert_eq!(media.media_uri, "https://media/video.mp4");
        assert_eq!(media.thumbnail_uri, None);
        assert_eq!(*orchestrator.generator().poll_count.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_request_carries_model_prompt_and_seed() {
        let fake = FakeGenerator::default();
        fake.push_poll(Ok(finished("https://media/1")));
        let orchestrator = GenerationOrchestrator::new(fake)
            .with_model("veo-test")
            .with_poll_config(fast_poll());
        let seeded = Prompt {
            text: "seeded".to_string(),
            seed_image: Some(SlideImage::new("QQ==", "image/png")),
        };

        orchestrator.submit_and_await(&seeded, "in test").await.unwrap();

        let requests = orchestrator.generator().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "veo-test");
        assert_eq!(requests[0].prompt, "seeded");
        assert_eq!(requests[0].count, 1);
        assert_eq!(requests[0].image, seeded.seed_image);
    }

    #[tokio::test]
    async fn test_tolerates_four_transient_failures() {
        let fake = FakeGenerator::default();
        fake.push_failures(4);
        fake.push_poll(Ok(finished("https://media/ok")));
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let media = orchestrator.submit_and_await(&prompt("p"), "in test").await.unwrap();
        assert_eq!(media.media_uri, "https://media/ok");
    }

    #[tokio::test]
    async fn test_five_consecutive_failures_exhaust_polling() {
        let fake = FakeGenerator::default();
        fake.push_failures(5);
        fake.push_poll(Ok(finished("https://media/never")));
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let err = orchestrator.submit_and_await(&prompt("p"), "in test").await.unwrap_err();
        match err {
            Error::PollingExhausted { attempts, last_error } => {
                assert_eq!(attempts, 5);
                assert!(last_error.contains("connection reset #4"));
            }
            other => panic!("expected PollingExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_polling_reports_classified_message() {
        let fake = FakeGenerator::default();
        for _ in 0..5 {
            fake.push_poll(Err(Error::Transport(
                "API error (500): Internal error encountered. (INTERNAL)".to_string(),
            )));
        }
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let err = orchestrator.submit_and_await(&prompt("p"), "in test").await.unwrap_err();
        match &err {
            Error::PollingExhausted { attempts, last_error } => {
                assert_eq!(*attempts, 5);
                assert_eq!(
                    last_error,
                    "An internal server error occurred with the API. Please try again later."
                );
            }
            other => panic!("expected PollingExhausted, got {:?}", other),
        }
        assert!(!err.to_string().contains("API error (500)"));
    }

    #[tokio::test]
    async fn test_successful_poll_resets_failure_count() {
        let fake = FakeGenerator::default();
        fake.push_failures(4);
        fake.push_poll(Ok(pending("operations/test")));
        fake.push_failures(4);
        fake.push_poll(Ok(finished("https://media/late")));
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let media = orchestrator.submit_and_await(&prompt("p"), "in test").await.unwrap();
        assert_eq!(media.media_uri, "https://media/late");
    }

    #[tokio::test]
    async fn test_done_without_video_is_generation_failed() {
        let fake = FakeGenerator::default();
        fake.push_poll(Ok(Operation {
            name: "operations/test".to_string(),
            done: true,
            response: Some(GenerationResponse::default()),
            error: None,
        }));
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let err = orchestrator.submit_and_await(&prompt("p"), "in test").await.unwrap_err();
        match err {
            Error::GenerationFailed(reason) => assert!(reason.contains("without providing a video link")),
            other => panic!("expected GenerationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_operation_error_is_classified() {
        let fake = FakeGenerator::default();
        fake.push_poll(Ok(Operation {
            name: "operations/test".to_string(),
            done: true,
            response: None,
            error: Some(OperationError {
                code: Some(400),
                message: "Blocked by safety settings".to_string(),
            }),
        }));
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let err = orchestrator.submit_and_await(&prompt("p"), "in test").await.unwrap_err();
        match err {
            Error::GenerationFailed(reason) => assert!(reason.contains("safety policy")),
            other => panic!("expected GenerationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_failure_is_classified() {
        let fake = FakeGenerator::default();
        *fake.submit_error.lock().unwrap() =
            Some("API error (400): Request contains an invalid argument.".to_string());
        let orchestrator = GenerationOrchestrator::new(fake).with_poll_config(fast_poll());

        let err = orchestrator.submit_and_await(&prompt("p"), "in test").await.unwrap_err();
        match err {
            Error::RemoteRejected { kind, message } => {
                assert_eq!(kind, RejectionKind::InvalidArgument);
                assert!(message.contains("Request contains an invalid argument."));
            }
            other => panic!("expected RemoteRejected, got {:?}", other),
        }
        assert_eq!(*orchestrator.generator().poll_count.lock().unwrap(), 0);
    }
}
