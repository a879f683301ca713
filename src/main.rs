// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use storycast::app_config::{self, Config, LanguageSpec, ProviderKind};
use storycast::pipeline::{PipelineController, Stage};
use storycast::providers::mock::MockGenerator;
use storycast::providers::{Generator, HttpGenerator};
use storycast::session::Session;
use storycast::style_library::StyleLibrary;

/// CLI Wrapper for ProviderKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliProvider> for ProviderKind {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::OpenAI => ProviderKind::OpenAI,
            CliProvider::Anthropic => ProviderKind::Anthropic,
            CliProvider::LMStudio => ProviderKind::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the interactive pipeline session (default command)
    Session,

    /// List the style guides in the style library
    Styles,

    /// Write the effective configuration to the config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions for storycast
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Storycast - staged YouTube content pipeline
///
/// Produces an outline, a narration script, SEO metadata and translations
/// from a topic, with a review checkpoint after every stage.
#[derive(Parser, Debug)]
#[command(name = "storycast")]
#[command(version)]
#[command(about = "Staged outline, script, metadata and translation pipeline for YouTube videos")]
#[command(long_about = "Storycast walks a video from topic to translated script and metadata.
Each stage is generated by a language model, reviewed, optionally edited and
then confirmed, which unlocks the next stage.

EXAMPLES:
    storycast                                  # Start an interactive session
    storycast -t en,ja session                 # Translate into English and Japanese
    storycast -p anthropic -m claude-3-5-sonnet-latest
    storycast --dry-run                        # Use a canned generator, no API calls
    storycast styles                           # List the style library
    storycast completions bash > storycast.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not exist
    a default one is created. Per-stage models can be overridden with the
    OUTLINE_AGENT_*, STORY_AGENT_*, SEO_AGENT_* and TRANSLATION_AGENT_*
    variables (MODEL, API_BASE, API_KEY), falling back to DEFAULT_OPENAI_MODEL_NAME,
    DEFAULT_OPENAI_API_BASE and DEFAULT_OPENAI_API_KEY. A .env file is read first.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Source language code (e.g., 'zh', 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Comma-separated target language codes (e.g., 'en,fr,de')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Provider used by every stage without its own setting
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Model used by every stage without its own setting
    #[arg(short, long)]
    model: Option<String>,

    /// Style library directory
    #[arg(long, env = "STORYCAST_STYLE_LIBRARY")]
    style_library: Option<PathBuf>,

    /// Directory exports are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Answer every generation with canned text instead of calling a model
    #[arg(long)]
    dry_run: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for a level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "\x1B[1;31m"),
            Level::Warn => ("🚧 ", "\x1B[1;33m"),
            Level::Info => ("", "\x1B[1;32m"),
            Level::Debug => ("🔍 ", "\x1B[1;36m"),
            Level::Trace => ("📋 ", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Raise the ceiling to trace; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);
    dotenvy::dotenv().ok();

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "storycast", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::InitConfig { force }) => run_init_config(&cli, force),
        Some(Commands::Styles) => run_styles(&cli),
        Some(Commands::Session) | None => run_session(&cli).await,
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &CommandLineOptions) -> Result<()> {
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }
    if let Some(code) = &options.source_language {
        config.source_language = LanguageSpec::from_code(code)?;
    }
    if let Some(codes) = &options.target_languages {
        config.target_languages = codes
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| LanguageSpec::from_code(c))
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(provider) = &options.provider {
        config.generation.default.provider = Some(provider.clone().into());
    }
    if let Some(model) = &options.model {
        config.generation.default.model = Some(model.clone());
    }
    if let Some(dir) = &options.style_library {
        config.style_library = dir.clone();
    }
    if let Some(dir) = &options.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(())
}

fn load_config(options: &CommandLineOptions) -> Result<Config> {
    let (mut config, created) = Config::load_or_create(&options.config_path)?;
    if created {
        warn!("Config file not found at {:?}, created a default config.", options.config_path);
    }

    apply_overrides(&mut config, options)?;
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));
    Ok(config)
}

fn run_init_config(options: &CommandLineOptions, force: bool) -> Result<()> {
    if options.config_path.exists() && !force {
        warn!("{:?} already exists; use --force to overwrite it", options.config_path);
        return Ok(());
    }

    let mut config = Config::default();
    apply_overrides(&mut config, options)?;
    config.validate().context("Configuration validation failed")?;
    config.save(&options.config_path)?;
    info!("Wrote {:?}", options.config_path);
    Ok(())
}

fn run_styles(options: &CommandLineOptions) -> Result<()> {
    let config = load_config(options)?;
    let library = StyleLibrary::new(&config.style_library);
    let entries = library.list()?;

    if entries.is_empty() {
        warn!("No style guides found in {:?}", library.root());
    }
    for entry in entries {
        println!("{}", entry);
    }
    Ok(())
}

async fn run_session(options: &CommandLineOptions) -> Result<()> {
    let config = load_config(options)?;

    let generator: Arc<dyn Generator> = if options.dry_run {
        info!("Dry run: generations return canned text");
        Arc::new(MockGenerator::working())
    } else {
        Arc::new(HttpGenerator::new())
    };

    let controller = PipelineController::new(config, generator);
    for stage in Stage::ALL {
        if let Some(generation_stage) = controller.stage(stage) {
            let model = generation_stage.model();
            info!("{}: {} via {} ({})", stage, model.model, model.provider, model.api_base);
        }
    }

    let interactive = std::io::stdin().is_terminal();
    let mut session = Session::new(controller, interactive);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin, &mut std::io::stdout()).await?;
    Ok(())
}
