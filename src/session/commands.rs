/*!
 * Line commands understood by the interactive session.
 */

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::pipeline::Stage;

/// A command line that could not be understood
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown stage '{0}' (expected outline, script, metadata or translation)")]
    UnknownStage(String),
}

/// What `show` prints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowTarget {
    Stage(Stage),
    TranslatedMetadata,
    Language(String),
}

/// What `translate` covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateTarget {
    All,
    Language(String),
}

/// Which download `export` writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportKind {
    Package(String),
    Stories,
    Metadata,
    Zip,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Topic(String),
    Upload(PathBuf),
    ClearUpload,
    Styles,
    Style(String),
    StyleFile(PathBuf),
    Generate(Stage),
    Show(ShowTarget),
    Edit { stage: Stage, path: PathBuf },
    Confirm(Stage),
    Translate(TranslateTarget),
    TranslateMetadata,
    Export { kind: ExportKind, dir: Option<PathBuf> },
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  help                                   Show this help
  status                                 Show the stage cursor and what is filled in
  topic <text>                           Set the video topic
  upload <path>                          Attach a reference document (.md/.txt)
  clear-upload                           Drop the reference document
  styles                                 List the style library
  style <name|none>                      Pick a style guide from the library
  style-file <path>                      Use an ad hoc style guide file
  generate <outline|script|metadata>     Generate or regenerate a stage
  show <stage|translated-metadata|lang>  Print the current text
  edit <stage> <path>                    Replace the displayed text with a file's contents
  confirm <stage>                        Freeze the displayed text and unlock the next stage
  translate <lang|all>                   Translate the confirmed script
  translate-metadata                     Translate the confirmed metadata into every language
  export <package <lang>|stories|metadata|zip|all> [dir]
                                         Write downloads to disk
  quit                                   Leave the session";

fn parse_stage(word: &str) -> Result<Stage, CommandError> {
    Stage::from_str(word).map_err(|_| CommandError::UnknownStage(word.to_string()))
}

/// Parse one input line; `Ok(None)` for blank lines and comments
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match name.to_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        "styles" => Command::Styles,
        "clear-upload" => Command::ClearUpload,
        "translate-metadata" => Command::TranslateMetadata,
        "topic" => Command::Topic(rest.to_string()),
        "upload" => match rest {
            "" => return Err(CommandError::Usage("upload <path>")),
            path => Command::Upload(PathBuf::from(path)),
        },
        "style" => match args.as_slice() {
            [name] => Command::Style(name.to_string()),
            _ => return Err(CommandError::Usage("style <name|none>")),
        },
        "style-file" => match rest {
            "" => return Err(CommandError::Usage("style-file <path>")),
            path => Command::StyleFile(PathBuf::from(path)),
        },
        "generate" | "gen" => match args.as_slice() {
            [stage] => Command::Generate(parse_stage(stage)?),
            _ => return Err(CommandError::Usage("generate <outline|script|metadata>")),
        },
        "show" => match args.as_slice() {
            ["translated-metadata"] => Command::Show(ShowTarget::TranslatedMetadata),
            [word] => match Stage::from_str(word) {
                Ok(stage) => Command::Show(ShowTarget::Stage(stage)),
                Err(_) => Command::Show(ShowTarget::Language(word.to_string())),
            },
            _ => return Err(CommandError::Usage("show <stage|translated-metadata|lang>")),
        },
        "edit" => match rest.split_once(char::is_whitespace) {
            Some((stage, path)) if !path.trim().is_empty() => Command::Edit {
                stage: parse_stage(stage)?,
                path: PathBuf::from(path.trim()),
            },
            _ => return Err(CommandError::Usage("edit <stage> <path>")),
        },
        "confirm" => match args.as_slice() {
            [stage] => Command::Confirm(parse_stage(stage)?),
            _ => return Err(CommandError::Usage("confirm <stage>")),
        },
        "translate" => match args.as_slice() {
            ["all"] => Command::Translate(TranslateTarget::All),
            [code] => Command::Translate(TranslateTarget::Language(code.to_string())),
            _ => return Err(CommandError::Usage("translate <lang|all>")),
        },
        "export" => parse_export(&args)?,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn parse_export(args: &[&str]) -> Result<Command, CommandError> {
    const USAGE: &str = "export <package <lang>|stories|metadata|zip|all> [dir]";

    let (kind, remaining) = match args {
        ["package", code, remaining @ ..] => (ExportKind::Package(code.to_string()), remaining),
        ["stories", remaining @ ..] => (ExportKind::Stories, remaining),
        ["metadata", remaining @ ..] => (ExportKind::Metadata, remaining),
        ["zip", remaining @ ..] => (ExportKind::Zip, remaining),
        ["all", remaining @ ..] => (ExportKind::All, remaining),
        _ => return Err(CommandError::Usage(USAGE)),
    };

    let dir = match remaining {
        [] => None,
        [dir] => Some(PathBuf::from(dir)),
        _ => return Err(CommandError::Usage(USAGE)),
    };

    Ok(Command::Export { kind, dir })
}
