//! Parser for LookML-style semantic-model sources.
//!
//! A project directory holds two kinds of files, distinguished by suffix:
//!
//! - `*.model.lkml` — connection info, includes, explores, inline views
//! - `*.view.lkml` — one or more view declarations
//!
//! Parsing runs in three stages: lexing ([`lexer`]), block parsing
//! ([`parser`]), and lowering into typed model values ([`lower`]). Only the
//! typed [`crate::model::Project`] leaves this module.
//!
//! A malformed file is logged and skipped; parsing fails outright only when
//! no usable file remains.
//!
//! # Example
//!
//! ```ignore
//! use groundsql::lookml;
//! use std::path::Path;
//!
//! let project = lookml::parse_project(Path::new("models/"))?;
//! println!("{} models, {} standalone views", project.models.len(), project.views.len());
//! ```

pub mod lexer;
mod lower;
mod parser;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Model, Project, View};

/// Errors that can occur while parsing model sources.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected character `{ch}` at line {line}")]
    UnexpectedCharacter { ch: char, line: usize },

    #[error("unterminated string literal at line {line}")]
    UnterminatedString { line: usize },

    #[error("unterminated expression block (missing `;;`) at line {line}")]
    UnterminatedExpression { line: usize },

    #[error("expected a key, found {found} at line {line}")]
    ExpectedKey { found: String, line: usize },

    #[error("expected `:` after key `{key}`, found {found} at line {line}")]
    ExpectedColon {
        key: String,
        found: String,
        line: usize,
    },

    #[error("expected a value, found {found} at line {line}")]
    ExpectedValue { found: String, line: usize },

    #[error("unclosed block at line {line}")]
    UnclosedBlock { line: usize },

    #[error("model repository path does not exist: {0}")]
    RepositoryNotFound(PathBuf),

    #[error("no usable model or view files found in {0}")]
    EmptyProject(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a model file's source text.
///
/// The model name comes from the file name by convention; pass it explicitly
/// here so sources can also be parsed from strings.
pub fn parse_model_source(name: &str, source: &str) -> ParseResult<Model> {
    let tokens = lexer::lex(source)?;
    let pairs = parser::Parser::new(tokens).parse()?;
    Ok(lower::lower_model(name, &pairs))
}

/// Parse a view file's source text. A single file may declare several views.
pub fn parse_view_source(source: &str) -> ParseResult<Vec<View>> {
    let tokens = lexer::lex(source)?;
    let pairs = parser::Parser::new(tokens).parse()?;
    Ok(lower::lower_views(&pairs))
}

/// Parse an entire project directory.
///
/// Walks the tree collecting `*.model.lkml` and `*.view.lkml` files. A file
/// that fails to parse is logged at warn level and skipped; the rest of the
/// project still loads. Fails only when the directory is missing or no file
/// parses successfully.
pub fn parse_project(repo_path: &Path) -> ParseResult<Project> {
    if !repo_path.exists() {
        return Err(ParseError::RepositoryNotFound(repo_path.to_path_buf()));
    }

    tracing::info!(path = %repo_path.display(), "parsing model project");

    let mut files = Vec::new();
    collect_source_files(repo_path, &mut files)?;
    files.sort();

    let mut project = Project::default();
    let mut parsed_files = 0usize;

    for path in &files {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "failed to read file, skipping");
                continue;
            }
        };

        if let Some(model_name) = file_name.strip_suffix(".model.lkml") {
            match parse_model_source(model_name, &source) {
                Ok(model) => {
                    tracing::info!(model = %model.name, "parsed model");
                    project.models.insert(model.name.clone(), model);
                    parsed_files += 1;
                }
                Err(err) => {
                    tracing::warn!(file = %path.display(), error = %err, "failed to parse model file, skipping");
                }
            }
        } else if file_name.ends_with(".view.lkml") {
            match parse_view_source(&source) {
                Ok(views) => {
                    for view in views {
                        tracing::info!(view = %view.name, "parsed view");
                        project.views.insert(view.name.clone(), view);
                    }
                    parsed_files += 1;
                }
                Err(err) => {
                    tracing::warn!(file = %path.display(), error = %err, "failed to parse view file, skipping");
                }
            }
        }
    }

    if parsed_files == 0 {
        return Err(ParseError::EmptyProject(repo_path.to_path_buf()));
    }

    tracing::info!(
        models = project.models.len(),
        views = project.views.len(),
        "parsed project"
    );
    Ok(project)
}

fn collect_source_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_source_files(&path, files)?;
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".model.lkml") || name.ends_with(".view.lkml") {
                files.push(path);
            }
        }
    }
    Ok(())
}
