/*!
 * Session state for one pipeline run.
 */

use serde::Serialize;
use std::collections::HashMap;

use crate::app_config::LanguageSpec;
use crate::pipeline::Stage;

/// Translated text stored for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslationEntry {
    pub script: String,
}

/// Artifacts of a single session plus the stage cursor.
///
/// The cursor starts at 1 and only moves forward, one step per confirm of
/// the stage it points at. Text fields are overwritten in place; there is no
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineState {
    stage_cursor: u8,
    outline: String,
    script: String,
    metadata: String,
    translated_metadata: String,
    translations: HashMap<String, TranslationEntry>,
    source_code: String,
}

impl PipelineState {
    /// Fresh state with every text empty and the cursor on the outline stage
    pub fn new(source: &LanguageSpec, targets: &[LanguageSpec]) -> Self {
        let translations = std::iter::once(source)
            .chain(targets.iter())
            .map(|language| (language.code.clone(), TranslationEntry::default()))
            .collect();

        Self {
            stage_cursor: Stage::Outline.number(),
            outline: String::new(),
            script: String::new(),
            metadata: String::new(),
            translated_metadata: String::new(),
            translations,
            source_code: source.code.clone(),
        }
    }

    pub fn cursor(&self) -> u8 {
        self.stage_cursor
    }

    pub fn current_stage(&self) -> Stage {
        Stage::from_number(self.stage_cursor).unwrap_or(Stage::Translation)
    }

    pub fn is_unlocked(&self, stage: Stage) -> bool {
        self.stage_cursor >= stage.number()
    }

    pub fn outline(&self) -> &str {
        &self.outline
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn translated_metadata(&self) -> &str {
        &self.translated_metadata
    }

    /// Stored text of a single-text stage; empty for the translation stage
    pub fn artifact(&self, stage: Stage) -> &str {
        match stage {
            Stage::Outline => &self.outline,
            Stage::Script => &self.script,
            Stage::Metadata => &self.metadata,
            Stage::Translation => "",
        }
    }

    /// Translated script for a language code; empty when unknown or not yet generated
    pub fn translation(&self, code: &str) -> &str {
        self.translations
            .get(code)
            .map(|entry| entry.script.as_str())
            .unwrap_or("")
    }

    pub fn has_language(&self, code: &str) -> bool {
        self.translations.contains_key(code)
    }

    /// Store freshly generated text for a single-text stage. Never moves the cursor.
    pub(crate) fn set_artifact(&mut self, stage: Stage, text: String) {
        match stage {
            Stage::Outline => self.outline = text,
            Stage::Script => self.script = text,
            Stage::Metadata => self.metadata = text,
            Stage::Translation => {}
        }
    }

    pub(crate) fn set_translation(&mut self, code: &str, text: String) {
        if let Some(entry) = self.translations.get_mut(code) {
            entry.script = text;
        }
    }

    pub(crate) fn set_translated_metadata(&mut self, text: String) {
        self.translated_metadata = text;
    }

    /// Freeze `text` as the stage's artifact.
    ///
    /// Advances the cursor by one only when `stage` is the stage the cursor
    /// points at. Returns whether the cursor moved.
    pub(crate) fn confirm(&mut self, stage: Stage, text: String) -> bool {
        if stage == Stage::Script {
            let source_code = self.source_code.clone();
            self.set_translation(&source_code, text.clone());
        }
        self.set_artifact(stage, text);

        let advances = stage.number() == self.stage_cursor && self.stage_cursor < Stage::Translation.number();
        if advances {
            self.stage_cursor += 1;
        }
        advances
    }
}
