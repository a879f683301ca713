/*!
 * # Storycast - staged YouTube content pipeline
 *
 * A Rust library that turns a topic into a video outline, a narration script,
 * SEO metadata and translations of both, with a human review checkpoint
 * between every stage.
 *
 * ## Features
 *
 * - Four generation stages (outline, script, metadata, translation), each a
 *   single call to a language model behind a fixed instruction template
 * - Explicit stage cursor: a stage unlocks only once the previous one is confirmed
 * - Editable drafts; the edited text is what gets confirmed
 * - Concurrent per-language script translation with one outstanding call per destination
 * - Style guides from a library directory or an ad hoc file
 * - Downloads: per-language comparison packages, summary documents and a zip bundle
 * - Providers:
 *   - OpenAI-compatible chat completions (OpenAI, LM Studio)
 *   - Anthropic API
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management and per-stage model resolution
 * - `pipeline`: The staged workflow:
 *   - `pipeline::align`: Line pairing for comparison tables
 *   - `pipeline::package`: Package, summary and zip assembly
 *   - `pipeline::prompts`: Instruction templates
 *   - `pipeline::stage`: Generation stages
 *   - `pipeline::state`: Session state and stage cursor
 *   - `pipeline::controller`: Gating, drafts, fan-out and downloads
 * - `providers`: Client implementations for the generation capability:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Scriptable generator for tests and dry runs
 * - `session`: Interactive line-command session
 * - `style_library`: Named style guides
 * - `file_utils`: File system operations and uploads
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod session;
pub mod style_library;

// Re-export main types for easier usage
pub use app_config::{Config, LanguageSpec};
pub use errors::{AppError, PackageError, PipelineError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use pipeline::{Artifact, PipelineController, PipelineState, Stage};
pub use providers::{Generator, HttpGenerator, PromptRequest};
pub use style_library::{StyleLibrary, StyleSelection};
