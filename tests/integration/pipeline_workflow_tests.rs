/*!
 * End-to-end tests of the staged pipeline driven through the controller
 */

use anyhow::Result;
use std::io::Cursor;

use storycast::errors::{PipelineError, ProviderError};
use storycast::file_utils::UploadedDocument;
use storycast::pipeline::package::ZIP_MIME;
use storycast::pipeline::{build_language_package, Stage};
use storycast::providers::mock::MockGenerator;
use storycast::style_library::StyleSelection;

use crate::common;

fn zip_member_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("member").name().to_string())
        .collect()
}

/// Scenario 1: no topic and no upload is rejected before any call
#[tokio::test]
async fn test_generate_outline_withNoTopicOrUpload_shouldRejectWithoutCall() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    for topic in ["", "   \n\t"] {
        let result = controller.generate_outline(topic, None).await;
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }
    assert_eq!(mock.call_count(), 0);
    assert!(controller.state().outline().is_empty());
    Ok(())
}

/// An upload alone supplies the topic (its file name) and the context
#[tokio::test]
async fn test_generate_outline_withUploadOnly_shouldUseFileNameAsTopic() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);
    let upload = UploadedDocument::from_bytes("deep_sea_creatures.md", "Anglerfish use bioluminescence.".as_bytes().to_vec())?;

    controller.generate_outline("", Some(&upload)).await?;

    let prompts = mock.prompts();
    let prompt = &prompts[0].user;
    assert!(prompt.contains("deep_sea_creatures.md"));
    assert!(prompt.contains("Anglerfish use bioluminescence."));
    assert!(!controller.state().outline().is_empty());
    Ok(())
}

/// Scenario 2: three script lines against a two-line translation
#[tokio::test]
async fn test_language_package_withShorterTranslation_shouldPadThirdRow() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working().with_custom_response(|_| "L1\nL2".to_string());
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    common::confirm_through(&mut controller, Stage::Metadata, &[(Stage::Script, "Line1\nLine2\nLine3")]);
    controller.translate_script("en").await?;

    let package = controller.language_package("en")?;
    assert_eq!(package.file_name, "en_story_package.md");
    assert_eq!(package.bytes, build_language_package("Line1\nLine2\nLine3", "L1\nL2"));

    let text = String::from_utf8(package.bytes)?;
    assert!(text.contains("| 3 | Line3 |  |"));
    Ok(())
}

/// Scenario 3: empty metadata blocks the metadata translation
#[tokio::test]
async fn test_translate_metadata_withEmptyMetadata_shouldRejectAndKeepEmpty() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    common::confirm_through(&mut controller, Stage::Metadata, &[(Stage::Metadata, "")]);
    assert_eq!(controller.state().cursor(), 4);

    let result = controller.translate_metadata().await;
    assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    assert!(controller.state().translated_metadata().is_empty());
    assert_eq!(mock.call_count(), 0);
    Ok(())
}

/// Scenario 4: no translations yet gives an empty but valid zip
#[tokio::test]
async fn test_zip_bundle_withNoTranslations_shouldBeEmptyArchive() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut controller = common::controller_with(common::test_config(dir.path()), &MockGenerator::working());

    common::confirm_through(&mut controller, Stage::Script, &[(Stage::Script, "源稿第一行\n第二行")]);

    let bundle = controller.zip_bundle()?;
    assert_eq!(bundle.file_name, "youtube_story_packages.zip");
    assert_eq!(bundle.mime, ZIP_MIME);
    assert!(zip_member_names(&bundle.bytes).is_empty());
    Ok(())
}

/// A failed generation leaves the previous value in place
#[tokio::test]
async fn test_failed_generation_withSentinel_shouldLeaveFieldUnchanged() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut controller = common::controller_with(common::test_config(dir.path()), &MockGenerator::failing());

    common::confirm_through(&mut controller, Stage::Metadata, &[
        (Stage::Outline, "SENTINEL OUTLINE"),
        (Stage::Script, "SENTINEL SCRIPT"),
        (Stage::Metadata, "SENTINEL METADATA"),
    ]);
    let before = controller.state().clone();

    assert!(controller.generate_outline("topic", None).await.is_err());
    assert!(controller.generate_script(&StyleSelection::none()).await.is_err());
    assert!(controller.generate_metadata().await.is_err());
    assert!(controller.translate_script("fr").await.is_err());
    assert!(controller.translate_metadata().await.is_err());

    assert_eq!(controller.state(), &before);
    Ok(())
}

/// A timed-out generation is an ordinary failure and keeps the old value
#[tokio::test]
async fn test_timed_out_generation_withSlowProvider_shouldKeepPreviousOutline() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut config = common::test_config(dir.path());
    config.generation.timeout_secs = 1;
    let mut controller = common::controller_with(config, &MockGenerator::slow(3_000));

    controller.edit(Stage::Outline, "kept")?;
    controller.confirm(Stage::Outline)?;

    let result = controller.generate_outline("Glaciers", None).await;
    assert!(matches!(result, Err(PipelineError::Generation(ProviderError::Timeout(1)))));
    assert_eq!(controller.state().outline(), "kept");
    Ok(())
}

/// Confirm advances only from the current stage and never moves back
#[tokio::test]
async fn test_confirm_withOutOfOrderStages_shouldNeverDecreaseCursor() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut controller = common::controller_with(common::test_config(dir.path()), &MockGenerator::working());

    assert!(matches!(controller.confirm(Stage::Script), Err(PipelineError::StageLocked { .. })));
    assert_eq!(controller.state().cursor(), 1);

    let mut last = controller.state().cursor();
    let actions = [Stage::Outline, Stage::Outline, Stage::Script, Stage::Outline, Stage::Metadata, Stage::Translation, Stage::Script];
    for stage in actions {
        controller.edit(stage, format!("{} text", stage)).ok();
        let cursor = controller.confirm(stage)?;
        assert!(cursor >= last);
        assert!(cursor - last <= 1);
        last = cursor;
    }
    assert_eq!(last, 4);
    Ok(())
}

/// Regenerating a stage does not touch other stages' confirmed text
#[tokio::test]
async fn test_regenerate_withConfirmedEarlierStages_shouldNotMutateThem() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut controller = common::controller_with(common::test_config(dir.path()), &MockGenerator::working());

    common::confirm_through(&mut controller, Stage::Script, &[
        (Stage::Outline, "confirmed outline"),
        (Stage::Script, "confirmed script"),
    ]);
    for _ in 0..3 {
        controller.generate_metadata().await?;
    }

    assert_eq!(controller.state().outline(), "confirmed outline");
    assert_eq!(controller.state().script(), "confirmed script");
    assert_eq!(controller.state().cursor(), 3);
    Ok(())
}

/// The displayed text is what gets confirmed
#[tokio::test]
async fn test_confirm_afterEdit_shouldStoreEditedText() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut controller = common::controller_with(common::test_config(dir.path()), &MockGenerator::working());

    let generated = controller.generate_outline("Coral reefs", None).await?.to_string();
    assert_eq!(controller.displayed(Stage::Outline), generated);

    controller.edit(Stage::Outline, "hand-tuned outline")?;
    assert_eq!(controller.displayed(Stage::Outline), "hand-tuned outline");
    assert_eq!(controller.state().outline(), generated);

    controller.confirm(Stage::Outline)?;
    assert_eq!(controller.state().outline(), "hand-tuned outline");
    Ok(())
}

/// Later stages stay locked until the earlier ones are confirmed
#[tokio::test]
async fn test_stage_actions_beforeUnlock_shouldBeLocked() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    assert!(matches!(
        controller.generate_script(&StyleSelection::none()).await,
        Err(PipelineError::StageLocked { stage: Stage::Script, cursor: 1 })
    ));
    assert!(matches!(controller.translate_script("en").await, Err(PipelineError::StageLocked { .. })));
    assert!(matches!(controller.edit(Stage::Metadata, "x"), Err(PipelineError::StageLocked { .. })));
    assert_eq!(mock.call_count(), 0);
    Ok(())
}

/// Fan-out translates every language and commits each independently
#[tokio::test]
async fn test_translate_all_withWorkingProvider_shouldFillEveryLanguage() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working().with_custom_response(common::shout_source_script);
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    common::confirm_through(&mut controller, Stage::Metadata, &[(Stage::Script, "line one\nline two")]);
    let outcomes = controller.translate_all_scripts().await;

    assert_eq!(outcomes.len(), 5);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));
    for code in ["en", "fr", "de", "es", "pt"] {
        assert_eq!(controller.state().translation(code), "LINE ONE\nLINE TWO");
    }
    assert_eq!(mock.call_count(), 5);

    let names = zip_member_names(&controller.zip_bundle()?.bytes);
    assert_eq!(names, vec![
        "en_story_package.md",
        "fr_story_package.md",
        "de_story_package.md",
        "es_story_package.md",
        "pt_story_package.md",
    ]);
    Ok(())
}

/// A language failing in the fan-out does not affect the others
#[tokio::test]
async fn test_translate_scripts_withIntermittentFailure_shouldIsolateFailures() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::intermittent(2).with_custom_response(common::shout_source_script);
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    common::confirm_through(&mut controller, Stage::Script, &[(Stage::Script, "abc")]);
    controller.edit(Stage::Metadata, "meta")?;
    controller.confirm(Stage::Metadata)?;

    let outcomes = controller.translate_scripts(&["en", "fr"]).await;
    let failed: Vec<&str> = outcomes.iter().filter(|o| o.result.is_err()).map(|o| o.code.as_str()).collect();
    let succeeded: Vec<&str> = outcomes.iter().filter(|o| o.result.is_ok()).map(|o| o.code.as_str()).collect();

    assert_eq!(failed.len(), 1);
    assert_eq!(succeeded.len(), 1);
    assert!(controller.state().translation(failed[0]).is_empty());
    assert_eq!(controller.state().translation(succeeded[0]), "ABC");
    Ok(())
}

/// A language listed twice in one fan-out is rejected as busy
#[tokio::test]
async fn test_translate_scripts_withDuplicateLanguage_shouldRejectSecondAsBusy() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    common::confirm_through(&mut controller, Stage::Metadata, &[]);
    let outcomes = controller.translate_scripts(&["de", "de", "xx"]).await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().any(|o| o.code == "de" && o.result.is_ok()));
    assert!(outcomes.iter().any(|o| matches!(o.result, Err(PipelineError::Busy(_)))));
    assert!(outcomes.iter().any(|o| matches!(o.result, Err(PipelineError::UnknownLanguage(_)))));
    assert_eq!(mock.call_count(), 1);

    let again = controller.translate_scripts(&["de"]).await;
    assert!(again[0].result.is_ok(), "the guard is released after the call");
    Ok(())
}

/// Fan-out outcomes line up with the requested codes, rejected ones included
#[tokio::test]
async fn test_translate_scripts_withMixedCodes_shouldKeepRequestOrder() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    common::confirm_through(&mut controller, Stage::Metadata, &[]);
    let outcomes = controller.translate_scripts(&["xx", "fr", "de", "fr", "es"]).await;

    let codes: Vec<&str> = outcomes.iter().map(|o| o.code.as_str()).collect();
    assert_eq!(codes, vec!["xx", "fr", "de", "fr", "es"]);
    assert!(matches!(outcomes[0].result, Err(PipelineError::UnknownLanguage(_))));
    assert!(outcomes[1].result.is_ok());
    assert!(outcomes[2].result.is_ok());
    assert!(matches!(outcomes[3].result, Err(PipelineError::Busy(_))));
    assert!(outcomes[4].result.is_ok());
    assert_eq!(mock.call_count(), 3);
    Ok(())
}

/// Metadata translation covers every language in one call
#[tokio::test]
async fn test_translate_metadata_withConfirmedMetadata_shouldIssueOneCall() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    common::confirm_through(&mut controller, Stage::Metadata, &[(Stage::Metadata, "# 标题\n描述\n标签")]);
    controller.translate_metadata().await?;

    assert_eq!(mock.call_count(), 1);
    let prompts = mock.prompts();
    let prompt = &prompts[0].user;
    for name in ["English (en)", "French (fr)", "German (de)", "Spanish (es)", "Portuguese (pt)"] {
        assert!(prompt.contains(name), "prompt should list {}", name);
    }
    assert!(!controller.state().translated_metadata().is_empty());
    Ok(())
}

/// Script generation carries the chosen style guide
#[tokio::test]
async fn test_generate_script_withLibraryStyle_shouldIncludeStyleGuide() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let config = common::test_config(dir.path());
    std::fs::create_dir_all(&config.style_library)?;
    common::create_test_file(&config.style_library, "noir.md", "Speak in short, shadowy sentences.")?;
    let mock = MockGenerator::working();
    let mut controller = common::controller_with(config, &mock);

    common::confirm_through(&mut controller, Stage::Outline, &[(Stage::Outline, "1. Night\n2. Rain")]);
    controller.generate_script(&StyleSelection::from_library("noir.md")).await?;
    controller.generate_script(&StyleSelection::from_library("none")).await?;

    let prompts = mock.prompts();
    assert!(prompts[0].user.contains("Speak in short, shadowy sentences."));
    assert!(!prompts[1].user.contains("Style guide"));
    Ok(())
}

/// Summaries and the source self-package are available once their inputs exist
#[tokio::test]
async fn test_downloads_withPartialTranslations_shouldListAvailableArtifacts() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mock = MockGenerator::working().with_custom_response(common::shout_source_script);
    let mut controller = common::controller_with(common::test_config(dir.path()), &mock);

    assert!(controller.available_downloads().is_empty());

    common::confirm_through(&mut controller, Stage::Metadata, &[
        (Stage::Script, "hola"),
        (Stage::Metadata, "meta"),
    ]);
    controller.translate_script("es").await?;

    let names: Vec<String> = controller.available_downloads().into_iter().map(|a| a.file_name).collect();
    assert_eq!(names, vec![
        "zh_story_package.md",
        "es_story_package.md",
        "summary_stories.md",
        "summary_metadata.md",
        "youtube_story_packages.zip",
    ]);

    let stories = String::from_utf8(controller.script_summary()?.bytes)?;
    assert!(stories.contains("## Source: Chinese (zh)\n\nhola"));
    assert!(stories.contains("## Spanish (es)\n\nHOLA"));
    assert!(!stories.contains("French"));

    let metadata = String::from_utf8(controller.metadata_summary()?.bytes)?;
    assert!(metadata.contains("meta"));
    assert!(!metadata.contains("## Translations"));

    assert!(matches!(controller.language_package("fr"), Err(PipelineError::MissingInput(_))));
    assert!(matches!(controller.language_package("ja"), Err(PipelineError::UnknownLanguage(_))));
    Ok(())
}
