/*!
 * In-process generator for tests and dry runs.
 *
 * Behaviors:
 * - `MockGenerator::working()` - answers with a tagged copy of the prompt's first task line
 * - `MockGenerator::intermittent(n)` - fails every Nth call
 * - `MockGenerator::failing()` - always fails with an API error
 * - `MockGenerator::slow(ms)` - sleeps before answering, for timeout paths
 *
 * Every submitted prompt is recorded so tests can assert on what was sent
 * and on how many calls were issued.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::app_config::ModelConfig;
use crate::errors::ProviderError;
use crate::providers::{Generator, PromptRequest};

/// Behavior mode for the mock generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails on every Nth request
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
    /// Sleeps before answering
    Slow { delay_ms: u64 },
}

/// Mock generator with shared call accounting
#[derive(Debug, Clone)]
pub struct MockGenerator {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<PromptRequest>>>,
    custom_response: Option<fn(&PromptRequest) -> String>,
}

impl MockGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator used by the succeeding behaviors
    pub fn with_custom_response(mut self, generator: fn(&PromptRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of submit calls received so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every prompt received so far, in call order
    pub fn prompts(&self) -> Vec<PromptRequest> {
        self.prompts.lock().clone()
    }

    fn respond(&self, request: &PromptRequest, model: &ModelConfig) -> String {
        if let Some(generator) = self.custom_response {
            return generator(request);
        }
        let headline = request
            .user
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();
        format!("[GENERATED by {}] {}", model.model, headline)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn submit(&self, request: &PromptRequest, model: &ModelConfig) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.clone());

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(request, model)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(self.respond(request, model))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.respond(request, model))
            }
        }
    }
}
