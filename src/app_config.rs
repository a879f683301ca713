use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::language_utils;
use crate::pipeline::Stage;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language the outline, script and metadata are written in
    #[serde(default = "default_source_language")]
    pub source_language: LanguageSpec,

    /// Languages the script is translated into, in display order
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<LanguageSpec>,

    /// Directory holding the named style guides
    #[serde(default = "default_style_library")]
    pub style_library: PathBuf,

    /// Directory downloads are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// A configured language: ISO code plus display name
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LanguageSpec {
    /// ISO 639-1 or 639-2 code, also used in package file names
    pub code: String,

    /// Display name; derived from the code when left empty
    #[serde(default)]
    pub name: String,
}

impl LanguageSpec {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Build a language from its code alone, deriving the English name
    pub fn from_code(code: &str) -> Result<Self> {
        let name = language_utils::get_language_name(code)?;
        Ok(Self::new(code.trim().to_lowercase(), name))
    }

    /// Name used in prompts and headings
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        language_utils::get_language_name(&self.code).unwrap_or_else(|_| self.code.clone())
    }

    /// Whether the given code designates this language
    pub fn matches(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
            || language_utils::language_codes_match(&self.code, code)
    }
}

/// Generation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    // @provider: OpenAI or any OpenAI-compatible endpoint
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl ProviderKind {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    /// Whether requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::LMStudio)
    }

    fn default_model(&self) -> String {
        match self {
            Self::OpenAI => "gpt-4o-mini".to_string(),
            Self::Anthropic => "claude-3-5-haiku-latest".to_string(),
            // Placeholder; users should set to the loaded model name in LM Studio
            Self::LMStudio => "local-model".to_string(),
        }
    }

    fn default_endpoint(&self) -> String {
        match self {
            Self::OpenAI => "https://api.openai.com/v1".to_string(),
            Self::Anthropic => "https://api.anthropic.com".to_string(),
            Self::LMStudio => "http://localhost:1234/v1".to_string(),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Partial model settings as written in the config file.
///
/// Unset fields fall through to the next layer during resolution.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ModelEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Per-stage model overrides
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StageModels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<ModelEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ModelEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<ModelEntry>,
}

impl StageModels {
    pub fn for_stage(&self, stage: Stage) -> Option<&ModelEntry> {
        match stage {
            Stage::Outline => self.outline.as_ref(),
            Stage::Script => self.script.as_ref(),
            Stage::Metadata => self.metadata.as_ref(),
            Stage::Translation => self.translation.as_ref(),
        }
    }
}

/// Generation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Settings shared by every stage
    #[serde(default)]
    pub default: ModelEntry,

    /// Stage-specific settings layered over `default`
    #[serde(default)]
    pub stages: StageModels,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            default: ModelEntry::default(),
            stages: StageModels::default(),
        }
    }
}

/// Fully resolved settings for one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_base: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Environment keys shared by every stage
pub const DEFAULT_MODEL_KEY: &str = "DEFAULT_OPENAI_MODEL_NAME";
pub const DEFAULT_API_BASE_KEY: &str = "DEFAULT_OPENAI_API_BASE";
pub const DEFAULT_API_KEY_KEY: &str = "DEFAULT_OPENAI_API_KEY";

impl GenerationConfig {
    /// Resolve the model settings for a stage from the process environment
    pub fn resolve(&self, stage: Stage) -> ModelConfig {
        self.resolve_with(stage, |key| std::env::var(key).ok())
    }

    /// Resolve the model settings for a stage.
    ///
    /// Precedence per field: `{PREFIX}_*` env, `DEFAULT_OPENAI_*` env,
    /// stage entry, default entry, provider built-in.
    pub fn resolve_with<F>(&self, stage: Stage, env: F) -> ModelConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = stage.env_prefix();
        let stage_entry = self.stages.for_stage(stage);
        let env_value = |suffix: &str, fallback: &str| {
            env(&format!("{}_{}", prefix, suffix))
                .filter(|v| !v.trim().is_empty())
                .or_else(|| env(fallback).filter(|v| !v.trim().is_empty()))
        };
        let file_value = |pick: fn(&ModelEntry) -> Option<&String>| {
            stage_entry
                .and_then(pick)
                .or_else(|| pick(&self.default))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let provider = stage_entry
            .and_then(|e| e.provider)
            .or(self.default.provider)
            .unwrap_or_default();

        let model = env_value("MODEL", DEFAULT_MODEL_KEY)
            .or_else(|| file_value(|e| e.model.as_ref()))
            .unwrap_or_else(|| provider.default_model());
        let api_base = env_value("API_BASE", DEFAULT_API_BASE_KEY)
            .or_else(|| file_value(|e| e.api_base.as_ref()))
            .unwrap_or_else(|| provider.default_endpoint());
        let api_key = env_value("API_KEY", DEFAULT_API_KEY_KEY)
            .or_else(|| file_value(|e| e.api_key.as_ref()))
            .unwrap_or_default();

        ModelConfig {
            provider,
            model,
            api_base,
            api_key,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        std::iter::once(&self.default).chain(Stage::ALL.iter().filter_map(|s| self.stages.for_stage(*s)))
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_style_library() -> PathBuf {
    PathBuf::from("style_library")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_source_language() -> LanguageSpec {
    LanguageSpec::new("zh", "Chinese")
}

fn default_target_languages() -> Vec<LanguageSpec> {
    vec![
        LanguageSpec::new("en", "English"),
        LanguageSpec::new("fr", "French"),
        LanguageSpec::new("de", "German"),
        LanguageSpec::new("es", "Spanish"),
        LanguageSpec::new("pt", "Portuguese"),
    ]
}

impl Config {
    /// Load a configuration file, writing the defaults first when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok((config, false));
        }

        let config = Config::default();
        config.save(path)?;
        Ok((config, true))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.source_language.code)
            .context("Invalid source language")?;

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        let mut seen = HashSet::new();
        for language in &self.target_languages {
            language_utils::validate_language_code(&language.code)
                .with_context(|| format!("Invalid target language '{}'", language.code))?;
            if !seen.insert(language.code.to_lowercase()) {
                return Err(anyhow!("Duplicate target language: {}", language.code));
            }
            if self.source_language.matches(&language.code) {
                return Err(anyhow!(
                    "Target language '{}' is the source language",
                    language.code
                ));
            }
        }

        if self.generation.timeout_secs == 0 {
            return Err(anyhow!("Generation timeout must be greater than zero"));
        }

        for entry in self.generation.entries() {
            if let Some(api_base) = entry.api_base.as_deref().filter(|b| !b.is_empty()) {
                Url::parse(api_base)
                    .with_context(|| format!("Invalid API base URL: {}", api_base))?;
            }
        }

        Ok(())
    }

    /// Find a configured target language by code
    pub fn target_language(&self, code: &str) -> Option<&LanguageSpec> {
        self.target_languages.iter().find(|l| l.matches(code))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_languages: default_target_languages(),
            style_library: default_style_library(),
            output_dir: default_output_dir(),
            generation: GenerationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
