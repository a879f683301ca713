/*!
 * Tests for error types
 */

use storycast::errors::{AppError, PipelineError, ProviderError};
use storycast::pipeline::Stage;

/// Test HTTP statuses map to the matching provider error
#[test]
fn test_provider_error_fromStatus_shouldClassifyStatusCodes() {
    assert!(matches!(ProviderError::from_status(401, "no".into()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(403, "no".into()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(429, "slow".into()), ProviderError::RateLimitExceeded(_)));
    assert!(matches!(
        ProviderError::from_status(502, "bad gateway".into()),
        ProviderError::ApiError { status_code: 502, .. }
    ));
}

/// Test pipeline errors render readable messages
#[test]
fn test_pipeline_error_display_shouldDescribeTheProblem() {
    let locked = PipelineError::StageLocked {
        stage: Stage::Metadata,
        cursor: 2,
    };
    assert!(locked.to_string().contains("metadata"));
    assert!(locked.to_string().contains('2'));

    let failure: PipelineError = ProviderError::Timeout(30).into();
    assert_eq!(failure.to_string(), "Generation failed: Generation timed out after 30 seconds");

    assert_eq!(PipelineError::Encoding("notes.md".into()).to_string(), "'notes.md' is not valid UTF-8 text");
}

/// Test conversions into the application error
#[test]
fn test_app_error_conversions_shouldWrapSources() {
    let from_pipeline: AppError = PipelineError::MissingInput("topic".into()).into();
    assert!(matches!(from_pipeline, AppError::Pipeline(PipelineError::MissingInput(_))));

    let from_io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(from_io, AppError::File(_)));

    let from_anyhow: AppError = anyhow::anyhow!("odd").into();
    assert_eq!(from_anyhow.to_string(), "Unknown error: odd");
}
