/*!
 * The staged content pipeline.
 *
 * - `align`: line pairing of two documents
 * - `package`: per-language packages, summaries and the zip bundle
 * - `prompts`: instruction templates for each stage
 * - `stage`: the stage enum, generation requests and the generation stage
 * - `state`: session state and the stage cursor
 * - `controller`: gating, drafts, fan-out and downloads
 */

pub mod align;
pub mod controller;
pub mod package;
pub mod prompts;
pub mod stage;
pub mod state;

pub use align::{align, AlignedRow};
pub use controller::{Destination, PipelineController, TranslationOutcome};
pub use package::{build_language_package, build_summary_document, build_zip_archive, Artifact};
pub use stage::{GenerationRequest, GenerationStage, Stage};
pub use state::{PipelineState, TranslationEntry};
