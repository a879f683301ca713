/*!
 * Tests for the generation capability and generation stages
 */

use std::sync::Arc;
use std::time::Duration;

use storycast::app_config::{GenerationConfig, LanguageSpec, ModelConfig, ProviderKind};
use storycast::errors::{PipelineError, ProviderError};
use storycast::pipeline::{GenerationRequest, GenerationStage, Stage};
use storycast::providers::mock::MockGenerator;
use storycast::providers::{Generator, HttpGenerator, PromptRequest};

use crate::common;

fn model(stage: Stage) -> ModelConfig {
    GenerationConfig::default().resolve_with(stage, common::no_env)
}

fn chinese() -> LanguageSpec {
    LanguageSpec::new("zh", "Chinese")
}

/// Test the mock records prompts and counts calls
#[tokio::test]
async fn test_mock_generator_withWorkingBehavior_shouldRecordPrompts() {
    let mock = MockGenerator::working();
    let request = PromptRequest::new("system", "\n  First task line\nsecond");

    let text = mock.submit(&request, &model(Stage::Outline)).await.unwrap();
    assert_eq!(text, "[GENERATED by gpt-4o-mini] First task line");
    assert_eq!(mock.call_count(), 1);
    assert_eq!(mock.prompts(), vec![request]);
}

/// Test intermittent failures hit every Nth call
#[tokio::test]
async fn test_mock_generator_withIntermittentBehavior_shouldFailEveryNth() {
    let mock = MockGenerator::intermittent(2);
    let request = PromptRequest::new("s", "u");
    let model = model(Stage::Script);

    assert!(mock.submit(&request, &model).await.is_ok());
    assert!(mock.submit(&request, &model).await.is_err());
    assert!(mock.submit(&request, &model).await.is_ok());
}

/// Test the HTTP generator refuses to call a keyed provider without a key
#[tokio::test]
async fn test_http_generator_withMissingApiKey_shouldFailBeforeRequest() {
    let generator = HttpGenerator::new();
    let mut model = model(Stage::Metadata);
    model.provider = ProviderKind::Anthropic;

    let result = generator.submit(&PromptRequest::new("s", "u"), &model).await;
    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
}

/// Test a stage renders the bound inputs into its template
#[tokio::test]
async fn test_generation_stage_withScriptTranslation_shouldBindLanguagesAndScript() {
    let mock = MockGenerator::working();
    let stage = GenerationStage::new(Stage::Translation, model(Stage::Translation), Arc::new(mock.clone()));
    let request = GenerationRequest::ScriptTranslation {
        script: "第一段\n第二段".into(),
        target: LanguageSpec::new("fr", "French"),
    };

    stage.generate(&request, &chinese()).await.unwrap();

    let prompts = mock.prompts();
    let prompt = &prompts[0];
    assert!(prompt.user.starts_with("Translate the following Chinese script into French."));
    assert!(prompt.user.ends_with("第一段\n第二段"));
    assert!(!prompt.user.contains('{'));
}

/// Test a slow generator is cut off by the stage timeout
#[tokio::test]
async fn test_generation_stage_withSlowGenerator_shouldTimeOut() {
    let mut model = model(Stage::Outline);
    model.timeout = Duration::from_millis(20);
    let stage = GenerationStage::new(Stage::Outline, model, Arc::new(MockGenerator::slow(500)));
    let request = GenerationRequest::Outline {
        topic: "Tides".into(),
        context: None,
    };

    let result = stage.generate(&request, &chinese()).await;
    assert!(matches!(result, Err(PipelineError::Generation(ProviderError::Timeout(_)))));
}

/// Test an empty answer is reported as a generation failure
#[tokio::test]
async fn test_generation_stage_withEmptyResponse_shouldFail() {
    let stage = GenerationStage::new(Stage::Metadata, model(Stage::Metadata), Arc::new(MockGenerator::empty()));
    let request = GenerationRequest::Metadata {
        outline: "o".into(),
        script: "s".into(),
    };

    let result = stage.generate(&request, &chinese()).await;
    assert!(matches!(result, Err(PipelineError::Generation(ProviderError::EmptyResponse))));
}

/// Test the raw text comes back unchanged
#[tokio::test]
async fn test_generation_stage_withCustomResponse_shouldReturnTextUnchanged() {
    let mock = MockGenerator::working().with_custom_response(|_| "  # Title\n\nBody  \n".to_string());
    let stage = GenerationStage::new(Stage::Outline, model(Stage::Outline), Arc::new(mock));
    let request = GenerationRequest::Outline {
        topic: "Volcanoes".into(),
        context: Some("Notes".into()),
    };

    assert_eq!(stage.generate(&request, &chinese()).await.unwrap(), "  # Title\n\nBody  \n");
}
