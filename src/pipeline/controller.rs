/*!
 * Pipeline controller.
 *
 * Owns the session state and sequences the four stages behind the stage
 * cursor. Every action either fully succeeds or leaves the state exactly as
 * it found it: generated text is committed only after the call returned
 * successfully, and all validation happens before any call is issued.
 */

use futures::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::app_config::{Config, LanguageSpec};
use crate::errors::PipelineError;
use crate::file_utils::UploadedDocument;
use crate::pipeline::package::{
    self, Artifact, METADATA_SUMMARY_FILE_NAME, SCRIPT_SUMMARY_FILE_NAME, ZIP_BUNDLE_FILE_NAME,
};
use crate::pipeline::stage::{GenerationRequest, GenerationStage, Stage};
use crate::pipeline::state::PipelineState;
use crate::providers::Generator;
use crate::style_library::{StyleLibrary, StyleSelection};

const SCRIPT_SUMMARY_TITLE: &str = "Multilingual Script Overview";
const METADATA_SUMMARY_TITLE: &str = "Multilingual Metadata Overview";

/// A state field a generation call writes to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    Outline,
    Script,
    Metadata,
    ScriptTranslation(String),
    TranslatedMetadata,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline => f.write_str("the outline"),
            Self::Script => f.write_str("the script"),
            Self::Metadata => f.write_str("the metadata"),
            Self::ScriptTranslation(code) => write!(f, "the '{}' translation", code),
            Self::TranslatedMetadata => f.write_str("the translated metadata"),
        }
    }
}

/// Destinations with a call outstanding
#[derive(Debug, Clone, Default)]
struct InFlight {
    active: Arc<Mutex<HashSet<Destination>>>,
}

impl InFlight {
    fn try_acquire(&self, destination: Destination) -> Result<InFlightGuard, PipelineError> {
        let mut active = self.active.lock();
        if !active.insert(destination.clone()) {
            return Err(PipelineError::Busy(destination.to_string()));
        }
        Ok(InFlightGuard {
            active: Arc::clone(&self.active),
            destination,
        })
    }
}

/// Releases its destination when dropped
struct InFlightGuard {
    active: Arc<Mutex<HashSet<Destination>>>,
    destination: Destination,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.destination);
    }
}

/// Outcome of one language in a translation fan-out
#[derive(Debug)]
pub struct TranslationOutcome {
    pub code: String,
    pub result: Result<(), PipelineError>,
}

/// Drives a single session through the staged workflow
#[derive(Debug)]
pub struct PipelineController {
    config: Config,
    state: PipelineState,
    drafts: HashMap<Stage, String>,
    stages: HashMap<Stage, GenerationStage>,
    style_library: StyleLibrary,
    in_flight: InFlight,
}

impl PipelineController {
    /// Create a controller resolving stage models from the process environment
    pub fn new(config: Config, generator: Arc<dyn Generator>) -> Self {
        Self::with_env(config, generator, |key| std::env::var(key).ok())
    }

    /// Create a controller resolving stage models through `env`
    pub fn with_env<F>(config: Config, generator: Arc<dyn Generator>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stages = Stage::ALL
            .iter()
            .map(|stage| {
                let generation_stage =
                    GenerationStage::from_config(*stage, &config.generation, Arc::clone(&generator), &env);
                (*stage, generation_stage)
            })
            .collect();

        let state = PipelineState::new(&config.source_language, &config.target_languages);
        let style_library = StyleLibrary::new(&config.style_library);

        Self {
            config,
            state,
            drafts: HashMap::new(),
            stages,
            style_library,
            in_flight: InFlight::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn style_library(&self) -> &StyleLibrary {
        &self.style_library
    }

    pub fn stage(&self, stage: Stage) -> Option<&GenerationStage> {
        self.stages.get(&stage)
    }

    /// Text currently shown for a stage: the pending edit if any, else the stored artifact
    pub fn displayed(&self, stage: Stage) -> &str {
        self.drafts
            .get(&stage)
            .map(String::as_str)
            .unwrap_or_else(|| self.state.artifact(stage))
    }

    /// Whether the displayed text differs from the stored artifact
    pub fn has_pending_edit(&self, stage: Stage) -> bool {
        self.drafts.contains_key(&stage)
    }

    fn ensure_unlocked(&self, stage: Stage) -> Result<(), PipelineError> {
        if self.state.is_unlocked(stage) {
            Ok(())
        } else {
            Err(PipelineError::StageLocked {
                stage,
                cursor: self.state.cursor(),
            })
        }
    }

    fn require_text<'a>(text: &'a str, what: &str) -> Result<&'a str, PipelineError> {
        if text.trim().is_empty() {
            Err(PipelineError::MissingInput(format!("{} is empty", what)))
        } else {
            Ok(text)
        }
    }

    fn target(&self, code: &str) -> Result<LanguageSpec, PipelineError> {
        self.config
            .target_language(code)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownLanguage(code.to_string()))
    }

    async fn run(&self, request: GenerationRequest, guard: InFlightGuard) -> Result<String, PipelineError> {
        let stage = request.stage();
        let generation_stage = self
            .stages
            .get(&stage)
            .ok_or_else(|| PipelineError::MissingInput(format!("no generation stage for {}", stage)))?;

        let result = generation_stage.generate(&request, &self.config.source_language).await;
        drop(guard);

        if let Err(e) = &result {
            error!("Generation for {} failed: {}", stage, e);
        }
        result
    }

    fn commit_artifact(&mut self, stage: Stage, text: String) -> &str {
        self.state.set_artifact(stage, text);
        self.drafts.remove(&stage);
        self.state.artifact(stage)
    }

    /// Replace the displayed text of a single-text stage before confirming it
    pub fn edit(&mut self, stage: Stage, text: impl Into<String>) -> Result<(), PipelineError> {
        self.ensure_unlocked(stage)?;
        if stage == Stage::Translation {
            return Err(PipelineError::MissingInput(
                "translations are stored per language and have no editable draft".to_string(),
            ));
        }
        self.drafts.insert(stage, text.into());
        Ok(())
    }

    /// Freeze the displayed text and advance the cursor when `stage` is current.
    ///
    /// Returns the cursor after the action.
    pub fn confirm(&mut self, stage: Stage) -> Result<u8, PipelineError> {
        self.ensure_unlocked(stage)?;
        if stage == Stage::Translation {
            return Ok(self.state.cursor());
        }

        let text = self
            .drafts
            .remove(&stage)
            .unwrap_or_else(|| self.state.artifact(stage).to_string());
        if self.state.confirm(stage, text) {
            info!("Confirmed {}; moving to stage {}", stage, self.state.current_stage());
        } else {
            info!("Confirmed {} again", stage);
        }
        Ok(self.state.cursor())
    }

    /// Stage 1: outline from a topic and/or reference document.
    ///
    /// With only a document, its file name stands in for the topic.
    pub async fn generate_outline(
        &mut self,
        topic: &str,
        reference: Option<&UploadedDocument>,
    ) -> Result<&str, PipelineError> {
        self.ensure_unlocked(Stage::Outline)?;
        let topic = match (topic.trim(), reference) {
            ("", None) => {
                return Err(PipelineError::MissingInput(
                    "enter a topic or upload a reference document".to_string(),
                ));
            }
            ("", Some(document)) => document.name.clone(),
            (topic, _) => topic.to_string(),
        };

        let request = GenerationRequest::Outline {
            topic,
            context: reference.map(|d| d.content.clone()),
        };
        let guard = self.in_flight.try_acquire(Destination::Outline)?;
        info!("Generating outline");
        let text = self.run(request, guard).await?;
        Ok(self.commit_artifact(Stage::Outline, text))
    }

    /// Stage 2: narration script from the confirmed outline
    pub async fn generate_script(&mut self, style: &StyleSelection) -> Result<&str, PipelineError> {
        self.ensure_unlocked(Stage::Script)?;
        let outline = Self::require_text(self.state.outline(), "the confirmed outline")?.to_string();
        let style_guide = style.resolve(&self.style_library)?;
        if style_guide.is_some() {
            debug!("Using a style guide for the script");
        }

        let request = GenerationRequest::Script { outline, style_guide };
        let guard = self.in_flight.try_acquire(Destination::Script)?;
        info!("Generating script");
        let text = self.run(request, guard).await?;
        Ok(self.commit_artifact(Stage::Script, text))
    }

    /// Stage 3: SEO metadata from the confirmed outline and script
    pub async fn generate_metadata(&mut self) -> Result<&str, PipelineError> {
        self.ensure_unlocked(Stage::Metadata)?;
        let script = Self::require_text(self.state.script(), "the confirmed script")?.to_string();
        let outline = self.state.outline().to_string();

        let request = GenerationRequest::Metadata { outline, script };
        let guard = self.in_flight.try_acquire(Destination::Metadata)?;
        info!("Generating metadata");
        let text = self.run(request, guard).await?;
        Ok(self.commit_artifact(Stage::Metadata, text))
    }

    fn script_translation_request(&self, code: &str) -> Result<(LanguageSpec, GenerationRequest), PipelineError> {
        self.ensure_unlocked(Stage::Translation)?;
        let target = self.target(code)?;
        let script = Self::require_text(self.state.script(), "the confirmed script")?.to_string();
        let request = GenerationRequest::ScriptTranslation {
            script,
            target: target.clone(),
        };
        Ok((target, request))
    }

    /// Stage 4: translate the confirmed script into one target language
    pub async fn translate_script(&mut self, code: &str) -> Result<&str, PipelineError> {
        let (target, request) = self.script_translation_request(code)?;
        let guard = self
            .in_flight
            .try_acquire(Destination::ScriptTranslation(target.code.clone()))?;
        info!("Translating script into {}", target.display_name());
        let text = self.run(request, guard).await?;
        self.state.set_translation(&target.code, text);
        Ok(self.state.translation(&target.code))
    }

    /// Stage 4: translate into several languages concurrently.
    ///
    /// Each language is validated and committed on its own; a failure only
    /// affects that language. A code listed twice is rejected as busy.
    /// Outcomes are returned in the order of `codes`.
    pub async fn translate_scripts<S: AsRef<str>>(&mut self, codes: &[S]) -> Vec<TranslationOutcome> {
        let mut slots: Vec<Option<TranslationOutcome>> = Vec::with_capacity(codes.len());
        let mut pending = Vec::new();

        for (index, code) in codes.iter().enumerate() {
            let code = code.as_ref();
            let prepared = self.script_translation_request(code).and_then(|(target, request)| {
                let guard = self
                    .in_flight
                    .try_acquire(Destination::ScriptTranslation(target.code.clone()))?;
                Ok((index, target, request, guard))
            });
            match prepared {
                Ok(job) => {
                    pending.push(job);
                    slots.push(None);
                }
                Err(e) => slots.push(Some(TranslationOutcome {
                    code: code.to_string(),
                    result: Err(e),
                })),
            }
        }

        info!("Translating script into {} language(s)", pending.len());
        let this = &*self;
        let finished = join_all(pending.into_iter().map(|(index, target, request, guard)| async move {
            let result = this.run(request, guard).await;
            (index, target.code, result)
        }))
        .await;

        for (index, code, result) in finished {
            let result = result.map(|text| self.state.set_translation(&code, text));
            if let Err(e) = &result {
                warn!("Translation into '{}' failed: {}", code, e);
            }
            slots[index] = Some(TranslationOutcome { code, result });
        }
        slots.into_iter().flatten().collect()
    }

    /// Stage 4: translate every configured target language
    pub async fn translate_all_scripts(&mut self) -> Vec<TranslationOutcome> {
        let codes: Vec<String> = self.config.target_languages.iter().map(|l| l.code.clone()).collect();
        self.translate_scripts(&codes).await
    }

    /// Stage 4: translate the confirmed metadata into all target languages in one call
    pub async fn translate_metadata(&mut self) -> Result<&str, PipelineError> {
        self.ensure_unlocked(Stage::Translation)?;
        let metadata = Self::require_text(self.state.metadata(), "the confirmed metadata")?.to_string();

        let request = GenerationRequest::MetadataTranslation {
            metadata,
            targets: self.config.target_languages.clone(),
        };
        let guard = self.in_flight.try_acquire(Destination::TranslatedMetadata)?;
        info!("Translating metadata");
        let text = self.run(request, guard).await?;
        self.state.set_translated_metadata(text);
        Ok(self.state.translated_metadata())
    }

    /// Comparison package for one language.
    ///
    /// The source language compares the script against itself.
    pub fn language_package(&self, code: &str) -> Result<Artifact, PipelineError> {
        let source_text = self.state.script();
        let source_code = &self.config.source_language.code;

        let (file_code, target_text) = if self.config.source_language.matches(code) {
            (source_code.clone(), source_text)
        } else {
            let target = self.target(code)?;
            let text = self.state.translation(&target.code);
            (target.code, text)
        };
        Self::require_text(target_text, &format!("the '{}' script", file_code))?;

        Ok(Artifact::markdown(
            package::package_file_name(&file_code),
            package::build_language_package(source_text, target_text),
        ))
    }

    /// Every script, source first, then targets in configured order
    pub fn script_summary(&self) -> Result<Artifact, PipelineError> {
        let source = &self.config.source_language;
        let script = Self::require_text(self.state.script(), "the confirmed script")?;

        let mut sections = vec![(
            format!("Source: {} ({})", source.display_name(), source.code),
            script,
        )];
        sections.extend(self.config.target_languages.iter().map(|language| {
            (
                format!("{} ({})", language.display_name(), language.code),
                self.state.translation(&language.code),
            )
        }));

        Ok(Artifact::markdown(
            SCRIPT_SUMMARY_FILE_NAME,
            package::build_summary_document(SCRIPT_SUMMARY_TITLE, &sections),
        ))
    }

    /// Source metadata followed by the merged translated block
    pub fn metadata_summary(&self) -> Result<Artifact, PipelineError> {
        let metadata = Self::require_text(self.state.metadata(), "the confirmed metadata")?;
        let sections = [
            (
                format!("Source: {}", self.config.source_language.display_name()),
                metadata,
            ),
            ("Translations".to_string(), self.state.translated_metadata()),
        ];

        Ok(Artifact::markdown(
            METADATA_SUMMARY_FILE_NAME,
            package::build_summary_document(METADATA_SUMMARY_TITLE, &sections),
        ))
    }

    /// Zip of every translated language's package
    pub fn zip_bundle(&self) -> Result<Artifact, PipelineError> {
        let script = Self::require_text(self.state.script(), "the confirmed script")?;
        let entries: Vec<(&str, &str)> = self
            .config
            .target_languages
            .iter()
            .map(|language| (language.code.as_str(), self.state.translation(&language.code)))
            .collect();

        let bytes = package::build_zip_archive(&entries, script)?;
        Ok(Artifact::zip(ZIP_BUNDLE_FILE_NAME, bytes))
    }

    /// Every download currently available, skipping those whose inputs are empty
    pub fn available_downloads(&self) -> Vec<Artifact> {
        let mut artifacts = Vec::new();
        let codes = std::iter::once(&self.config.source_language)
            .chain(self.config.target_languages.iter())
            .map(|l| l.code.clone())
            .collect::<Vec<_>>();

        for code in codes {
            if let Ok(artifact) = self.language_package(&code) {
                artifacts.push(artifact);
            }
        }
        artifacts.extend(self.script_summary().ok());
        artifacts.extend(self.metadata_summary().ok());
        match self.zip_bundle() {
            Ok(artifact) => artifacts.push(artifact),
            Err(PipelineError::MissingInput(_)) => {}
            Err(e) => error!("Failed to build the zip bundle: {}", e),
        }
        artifacts
    }
}
