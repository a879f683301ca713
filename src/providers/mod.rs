/*!
 * Provider implementations for the generation capability.
 *
 * This module contains client implementations for the supported LLM providers:
 * - OpenAI: OpenAI API and any OpenAI-compatible endpoint (LM Studio included)
 * - Anthropic: Anthropic API integration
 * - Mock: scripted in-process generator for tests and dry runs
 *
 * Pipeline code never talks to a client directly. It goes through the
 * object-safe [`Generator`] trait, which takes a rendered prompt plus the
 * resolved model settings and answers with plain text.
 */

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::fmt::Debug;

use crate::app_config::{ModelConfig, ProviderKind};
use crate::errors::ProviderError;

use self::anthropic::{Anthropic, AnthropicRequest};
use self::openai::{OpenAI, OpenAIRequest};

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the generator.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// A fully rendered instruction ready to be submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Role preamble sent as the system message
    pub system: String,
    /// Task body with all inputs bound
    pub user: String,
}

impl PromptRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// The generation capability: submit instructions, receive generated text.
#[async_trait]
pub trait Generator: Send + Sync + Debug {
    /// Submit one request; no retry happens at this layer
    async fn submit(&self, request: &PromptRequest, model: &ModelConfig) -> Result<String, ProviderError>;
}

/// Generator backed by the HTTP provider clients
#[derive(Debug, Clone, Default)]
pub struct HttpGenerator {
    client: Client,
}

impl HttpGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn submit(&self, request: &PromptRequest, model: &ModelConfig) -> Result<String, ProviderError> {
        if model.provider.requires_api_key() && model.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(format!(
                "No API key configured for {}",
                model.provider.display_name()
            )));
        }

        debug!(
            "Submitting {} prompt chars to {} model '{}'",
            request.system.len() + request.user.len(),
            model.provider.display_name(),
            model.model
        );

        match model.provider {
            ProviderKind::OpenAI | ProviderKind::LMStudio => {
                let client = OpenAI::with_client(self.client.clone(), &model.api_key, &model.api_base);
                let body = OpenAIRequest::new(&model.model)
                    .add_message("system", &request.system)
                    .add_message("user", &request.user)
                    .temperature(model.temperature)
                    .max_tokens(model.max_tokens);
                let response = client.complete(body).await?;
                Ok(OpenAI::extract_text(&response))
            }
            ProviderKind::Anthropic => {
                let client = Anthropic::with_client(self.client.clone(), &model.api_key, &model.api_base);
                let body = AnthropicRequest::new(&model.model, model.max_tokens)
                    .system(&request.system)
                    .add_message("user", &request.user)
                    .temperature(model.temperature);
                let response = client.complete(body).await?;
                Ok(Anthropic::extract_text(&response))
            }
        }
    }
}

pub mod anthropic;
pub mod mock;
pub mod openai;
