/*!
 * Interactive session module.
 *
 * This module provides:
 * - Parsing of the line commands
 * - The read-eval loop that drives a pipeline controller
 */

pub mod commands;
pub mod repl;

// Re-export main types
pub use commands::{parse_command, Command, CommandError, ExportKind, ShowTarget, TranslateTarget};
pub use repl::{Outcome, Session};
