/*!
 * Line-oriented interactive session over the pipeline controller.
 *
 * Every command runs to completion before the next line is read. Errors are
 * reported and the session carries on; only `quit` or end of input ends it.
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::fmt::Write as _;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::errors::{AppError, PipelineError};
use crate::file_utils::{FileManager, UploadedDocument};
use crate::pipeline::{Artifact, PipelineController, Stage};
use crate::session::commands::{parse_command, Command, ExportKind, ShowTarget, TranslateTarget, HELP_TEXT};
use crate::style_library::{StyleSelection, NO_STYLE};

const PROMPT: &str = "storycast> ";

/// Result of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text to print before reading the next command
    Continue(String),
    Quit,
}

/// Inputs collected between commands plus the controller they feed
#[derive(Debug)]
pub struct Session {
    controller: PipelineController,
    topic: String,
    reference: Option<UploadedDocument>,
    style: StyleSelection,
    show_progress: bool,
}

async fn with_spinner<F, T>(enabled: bool, message: String, future: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = if enabled {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let output = future.await;
    spinner.finish_and_clear();
    output
}

fn or_empty(text: &str) -> &str {
    if text.trim().is_empty() { "(empty)" } else { text }
}

fn filled(text: &str) -> String {
    if text.trim().is_empty() {
        "empty".to_string()
    } else {
        format!("{} chars", text.chars().count())
    }
}

impl Session {
    pub fn new(controller: PipelineController, show_progress: bool) -> Self {
        Self {
            controller,
            topic: String::new(),
            reference: None,
            style: StyleSelection::none(),
            show_progress,
        }
    }

    pub fn controller(&self) -> &PipelineController {
        &self.controller
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R, W>(&mut self, reader: R, out: &mut W) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Type 'help' for the list of commands.")?;
        let mut lines = reader.lines();

        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };

            match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(command)) => match self.execute(command).await {
                    Ok(Outcome::Continue(text)) => writeln!(out, "{}", text)?,
                    Ok(Outcome::Quit) => break,
                    Err(e) => {
                        warn!("Command failed: {}", e);
                        writeln!(out, "Error: {}", e)?;
                    }
                },
                Err(e) => writeln!(out, "{}", e)?,
            }
        }

        Ok(())
    }

    /// Run a single command against the session
    pub async fn execute(&mut self, command: Command) -> Result<Outcome, AppError> {
        debug!("Executing {:?}", command);
        let text = match command {
            Command::Quit => return Ok(Outcome::Quit),
            Command::Help => HELP_TEXT.to_string(),
            Command::Status => self.status(),
            Command::Topic(topic) => {
                self.topic = topic;
                format!("Topic set to '{}'", self.topic)
            }
            Command::Upload(path) => {
                let document = Self::load_document(&path)?;
                let message = format!("Attached reference '{}' ({} chars)", document.name, document.content.chars().count());
                self.reference = Some(document);
                message
            }
            Command::ClearUpload => {
                self.reference = None;
                "Reference document removed".to_string()
            }
            Command::Styles => self.styles()?,
            Command::Style(name) => self.select_style(name)?,
            Command::StyleFile(path) => {
                let document = Self::load_document(&path)?;
                let message = format!("Using style guide file '{}'", document.name);
                self.style.upload = Some(document);
                message
            }
            Command::Generate(stage) => self.generate(stage).await?,
            Command::Show(target) => self.show(target)?,
            Command::Edit { stage, path } => {
                let text = FileManager::read_utf8(&path)?;
                self.controller.edit(stage, text)?;
                format!("Replaced the {} draft with {:?}; confirm to keep it", stage, path)
            }
            Command::Confirm(stage) => {
                let before = self.controller.state().cursor();
                let cursor = self.controller.confirm(stage)?;
                if cursor > before {
                    format!("Confirmed {}. Unlocked stage {}: {}", stage, cursor, self.controller.state().current_stage())
                } else {
                    format!("Confirmed {}. Still on stage {}", stage, cursor)
                }
            }
            Command::Translate(target) => self.translate(target).await?,
            Command::TranslateMetadata => {
                let text = with_spinner(
                    self.show_progress,
                    "Translating metadata".to_string(),
                    self.controller.translate_metadata(),
                )
                .await?;
                text.to_string()
            }
            Command::Export { kind, dir } => self.export(kind, dir)?,
        };

        Ok(Outcome::Continue(text))
    }

    fn load_document(path: &Path) -> Result<UploadedDocument, AppError> {
        if !FileManager::is_text_document(path) {
            return Err(AppError::File(format!("{:?} is not a .md or .txt file", path)));
        }
        Ok(UploadedDocument::from_path(path)?)
    }

    fn status(&self) -> String {
        let state = self.controller.state();
        let config = self.controller.config();
        let mut text = String::new();

        let _ = writeln!(text, "Stage {} of 4: {}", state.cursor(), state.current_stage());
        let _ = writeln!(text, "Topic: {}", or_empty(&self.topic));
        let _ = writeln!(
            text,
            "Reference: {}",
            self.reference.as_ref().map(|d| d.name.as_str()).unwrap_or("(none)")
        );
        let style = match (&self.style.upload, &self.style.library_entry) {
            (Some(upload), _) => format!("file '{}'", upload.name),
            (None, Some(entry)) => entry.clone(),
            (None, None) => NO_STYLE.to_string(),
        };
        let _ = writeln!(text, "Style guide: {}", style);

        for stage in [Stage::Outline, Stage::Script, Stage::Metadata] {
            let pending = if self.controller.has_pending_edit(stage) { " (edited, not confirmed)" } else { "" };
            let _ = writeln!(text, "{}: {}{}", stage, filled(state.artifact(stage)), pending);
        }
        for language in &config.target_languages {
            let _ = writeln!(
                text,
                "  {} ({}): {}",
                language.display_name(),
                language.code,
                filled(state.translation(&language.code))
            );
        }
        let _ = write!(text, "Translated metadata: {}", filled(state.translated_metadata()));
        text
    }

    fn styles(&self) -> Result<String, AppError> {
        let library = self.controller.style_library();
        let entries = library.list()?;
        if entries.is_empty() {
            return Ok(format!("No style guides in {:?}", library.root()));
        }
        Ok(std::iter::once(NO_STYLE.to_string())
            .chain(entries)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn select_style(&mut self, name: String) -> Result<String, AppError> {
        if name.eq_ignore_ascii_case(NO_STYLE) {
            self.style.library_entry = None;
            return Ok("No library style guide selected".to_string());
        }
        let entries = self.controller.style_library().list()?;
        if !entries.contains(&name) {
            return Err(PipelineError::MissingInput(format!("style guide '{}' is not in the library", name)).into());
        }
        let message = format!("Selected style guide '{}'", name);
        self.style.library_entry = Some(name);
        Ok(message)
    }

    async fn generate(&mut self, stage: Stage) -> Result<String, AppError> {
        let message = format!("Generating {}", stage);
        let show_progress = self.show_progress;
        let text = match stage {
            Stage::Outline => {
                with_spinner(
                    show_progress,
                    message,
                    self.controller.generate_outline(&self.topic, self.reference.as_ref()),
                )
                .await?
            }
            Stage::Script => with_spinner(show_progress, message, self.controller.generate_script(&self.style)).await?,
            Stage::Metadata => with_spinner(show_progress, message, self.controller.generate_metadata()).await?,
            Stage::Translation => {
                return Ok("Use 'translate <lang|all>' or 'translate-metadata' for the translation stage".to_string());
            }
        };
        Ok(text.to_string())
    }

    fn show(&self, target: ShowTarget) -> Result<String, AppError> {
        let state = self.controller.state();
        let config = self.controller.config();

        let text = match target {
            ShowTarget::Stage(Stage::Translation) => {
                let mut text = String::new();
                for language in &config.target_languages {
                    let _ = writeln!(text, "{} ({}): {}", language.display_name(), language.code, filled(state.translation(&language.code)));
                }
                let _ = write!(text, "Translated metadata: {}", filled(state.translated_metadata()));
                return Ok(text);
            }
            ShowTarget::Stage(stage) => self.controller.displayed(stage),
            ShowTarget::TranslatedMetadata => state.translated_metadata(),
            ShowTarget::Language(code) => {
                if config.source_language.matches(&code) {
                    state.script()
                } else {
                    let language = config
                        .target_language(&code)
                        .ok_or(PipelineError::UnknownLanguage(code))?;
                    state.translation(&language.code)
                }
            }
        };
        Ok(or_empty(text).to_string())
    }

    async fn translate(&mut self, target: TranslateTarget) -> Result<String, AppError> {
        match target {
            TranslateTarget::Language(code) => {
                let message = format!("Translating script into {}", code);
                let text = with_spinner(self.show_progress, message, self.controller.translate_script(&code)).await?;
                Ok(text.to_string())
            }
            TranslateTarget::All => {
                let outcomes = with_spinner(
                    self.show_progress,
                    "Translating script into every language".to_string(),
                    self.controller.translate_all_scripts(),
                )
                .await;

                let mut text = String::new();
                for outcome in &outcomes {
                    let _ = match &outcome.result {
                        Ok(()) => writeln!(text, "{}: done", outcome.code),
                        Err(e) => writeln!(text, "{}: {}", outcome.code, e),
                    };
                }
                Ok(text.trim_end().to_string())
            }
        }
    }

    fn collect_artifacts(&self, kind: ExportKind) -> Result<Vec<Artifact>, PipelineError> {
        let artifacts = match kind {
            ExportKind::Package(code) => vec![self.controller.language_package(&code)?],
            ExportKind::Stories => vec![self.controller.script_summary()?],
            ExportKind::Metadata => vec![self.controller.metadata_summary()?],
            ExportKind::Zip => vec![self.controller.zip_bundle()?],
            ExportKind::All => self.controller.available_downloads(),
        };
        if artifacts.is_empty() {
            return Err(PipelineError::MissingInput("nothing to export yet".to_string()));
        }
        Ok(artifacts)
    }

    fn export(&self, kind: ExportKind, dir: Option<PathBuf>) -> Result<String, AppError> {
        let artifacts = self.collect_artifacts(kind)?;
        let dir = dir.unwrap_or_else(|| FileManager::timestamped_dir(&self.controller.config().output_dir));

        let mut text = String::new();
        for artifact in &artifacts {
            let path = dir.join(&artifact.file_name);
            FileManager::write_bytes(&path, &artifact.bytes)?;
            let _ = writeln!(text, "Wrote {:?} ({}, {} bytes)", path, artifact.mime, artifact.bytes.len());
        }
        Ok(text.trim_end().to_string())
    }
}
