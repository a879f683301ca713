/*!
 * Generation stages.
 *
 * A stage binds its inputs into a fixed instruction template, submits the
 * result to the generation capability and hands back the produced text
 * untouched. The four stages differ only in template and bindings.
 */

use log::{debug, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::app_config::{GenerationConfig, LanguageSpec, ModelConfig};
use crate::errors::{PipelineError, ProviderError};
use crate::pipeline::prompts::{self, TemplateKind};
use crate::providers::{Generator, PromptRequest};

/// One phase of the pipeline, numbered in cursor order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Outline,
    Script,
    Metadata,
    Translation,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Outline, Stage::Script, Stage::Metadata, Stage::Translation];

    /// Cursor value at which this stage becomes available (1..=4)
    pub fn number(self) -> u8 {
        match self {
            Stage::Outline => 1,
            Stage::Script => 2,
            Stage::Metadata => 3,
            Stage::Translation => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| s.number() == number)
    }

    /// Prefix of the per-stage model environment keys
    pub fn env_prefix(self) -> &'static str {
        match self {
            Stage::Outline => "OUTLINE_AGENT",
            Stage::Script => "STORY_AGENT",
            Stage::Metadata => "SEO_AGENT",
            Stage::Translation => "TRANSLATION_AGENT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Outline => "outline",
            Stage::Script => "script",
            Stage::Metadata => "metadata",
            Stage::Translation => "translation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "outline" => Ok(Stage::Outline),
            "2" | "script" | "story" => Ok(Stage::Script),
            "3" | "metadata" | "seo" => Ok(Stage::Metadata),
            "4" | "translation" | "translations" => Ok(Stage::Translation),
            other => Err(anyhow::anyhow!("Unknown stage: {}", other)),
        }
    }
}

/// Template category plus bound inputs for one generation call.
///
/// Built fresh for every invocation and never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Outline {
        topic: String,
        context: Option<String>,
    },
    Script {
        outline: String,
        style_guide: Option<String>,
    },
    Metadata {
        outline: String,
        script: String,
    },
    ScriptTranslation {
        script: String,
        target: LanguageSpec,
    },
    MetadataTranslation {
        metadata: String,
        targets: Vec<LanguageSpec>,
    },
}

impl GenerationRequest {
    /// Stage whose model settings serve this request
    pub fn stage(&self) -> Stage {
        match self {
            Self::Outline { .. } => Stage::Outline,
            Self::Script { .. } => Stage::Script,
            Self::Metadata { .. } => Stage::Metadata,
            Self::ScriptTranslation { .. } | Self::MetadataTranslation { .. } => Stage::Translation,
        }
    }

    pub fn template(&self) -> TemplateKind {
        match self {
            Self::Outline { .. } => TemplateKind::Outline,
            Self::Script { .. } => TemplateKind::Script,
            Self::Metadata { .. } => TemplateKind::Metadata,
            Self::ScriptTranslation { .. } => TemplateKind::ScriptTranslation,
            Self::MetadataTranslation { .. } => TemplateKind::MetadataTranslation,
        }
    }

    /// Bind the inputs into the template
    pub fn render(&self, source: &LanguageSpec) -> PromptRequest {
        let template = self.template();
        let source_language = source.display_name();
        let user = match self {
            Self::Outline { topic, context } => {
                let context_section = prompts::optional_section("Reference material", context.as_deref());
                template.render(&[
                    ("source_language", source_language.as_str()),
                    ("topic", topic.as_str()),
                    ("context_section", context_section.as_str()),
                ])
            }
            Self::Script { outline, style_guide } => {
                let style_section = prompts::optional_section("Style guide", style_guide.as_deref());
                template.render(&[
                    ("source_language", source_language.as_str()),
                    ("outline", outline.as_str()),
                    ("style_section", style_section.as_str()),
                ])
            }
            Self::Metadata { outline, script } => template.render(&[
                ("source_language", source_language.as_str()),
                ("outline", outline.as_str()),
                ("script", script.as_str()),
            ]),
            Self::ScriptTranslation { script, target } => {
                let target_language = target.display_name();
                template.render(&[
                    ("source_language", source_language.as_str()),
                    ("target_language", target_language.as_str()),
                    ("script", script.as_str()),
                ])
            }
            Self::MetadataTranslation { metadata, targets } => {
                let names = targets
                    .iter()
                    .map(|t| format!("{} ({})", t.display_name(), t.code))
                    .collect::<Vec<_>>()
                    .join(", ");
                let count = targets.len().to_string();
                template.render(&[
                    ("source_language", source_language.as_str()),
                    ("target_languages", names.as_str()),
                    ("language_count", count.as_str()),
                    ("metadata", metadata.as_str()),
                ])
            }
        };

        PromptRequest::new(template.system_prompt(), user)
    }
}

/// A stage bound to its resolved model settings and the shared generator
#[derive(Debug, Clone)]
pub struct GenerationStage {
    stage: Stage,
    model: ModelConfig,
    generator: Arc<dyn Generator>,
}

impl GenerationStage {
    pub fn new(stage: Stage, model: ModelConfig, generator: Arc<dyn Generator>) -> Self {
        Self { stage, model, generator }
    }

    /// Build a stage resolving its model from config and the given environment lookup
    pub fn from_config<F>(stage: Stage, config: &GenerationConfig, generator: Arc<dyn Generator>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(stage, config.resolve_with(stage, env), generator)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Run one generation call.
    ///
    /// Single attempt under the model timeout. An empty answer counts as a
    /// failure so callers never overwrite an artifact with nothing.
    pub async fn generate(&self, request: &GenerationRequest, source: &LanguageSpec) -> Result<String, PipelineError> {
        let prompt = request.render(source);
        debug!(
            "Stage {} rendered a {} prompt ({} chars)",
            self.stage,
            request.template().name(),
            prompt.user.len()
        );

        let text = match tokio::time::timeout(self.model.timeout, self.generator.submit(&prompt, &self.model)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Stage {} timed out after {:?}", self.stage, self.model.timeout);
                return Err(ProviderError::Timeout(self.model.timeout.as_secs()).into());
            }
        };

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }
        Ok(text)
    }
}
