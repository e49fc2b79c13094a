pub mod imports;
pub mod languages;

use std::path::{Path, PathBuf};

use tracing::debug;
use tree_sitter::Parser;

use crate::error::ParseError;

pub use imports::{ImportIdentifier, trim_quotes};
use languages::{GO_EXTENSION, language_for_extension};

/// Options controlling which files of a package are parsed.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Also parse `_test.go` files.
    pub include_tests: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_tests: true,
        }
    }
}

/// Extract the raw import identifiers of the package in `dir`.
///
/// Every Go file directly inside `dir` is parsed with one reused parser; the
/// imports of all files are returned combined, in file-name order. Only the
/// package clause and import declarations have to be well-formed.
///
/// # Errors
/// - [`ParseError::ReadDir`] if `dir` is missing or unreadable
/// - [`ParseError::NoSourceFiles`] if `dir` contains no Go files
/// - [`ParseError::ReadFile`] / [`ParseError::Syntax`] for a broken file
pub fn extract_imports(dir: &Path, options: ParseOptions) -> Result<Vec<ImportIdentifier>, ParseError> {
    let files = list_source_files(dir, options)?;
    if files.is_empty() {
        return Err(ParseError::NoSourceFiles {
            dir: dir.to_path_buf(),
        });
    }

    let language = language_for_extension(GO_EXTENSION)
        .ok_or_else(|| ParseError::Grammar("no grammar for .go".to_owned()))?;
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::Grammar(e.to_string()))?;

    let mut all = Vec::new();
    for file in &files {
        let source = std::fs::read(file).map_err(|source| ParseError::ReadFile {
            file: file.clone(),
            source,
        })?;

        // `parse` only returns None on timeout or cancellation, neither of which is configured.
        let tree = parser.parse(&source, None).ok_or_else(|| ParseError::Syntax {
            file: file.clone(),
            line: 1,
            context: "source file",
        })?;

        imports::validate_prologue(&tree, &source, file)?;
        let found = imports::extract_imports(&tree, &source, &language, file);
        debug!(file = %file.display(), imports = found.len(), "parsed imports");
        all.extend(found);
    }

    Ok(all)
}

/// List the Go files of a single package directory (non-recursive), sorted.
///
/// Names starting with `.` or `_` are skipped, matching the Go toolchain.
fn list_source_files(dir: &Path, options: ParseOptions) -> Result<Vec<PathBuf>, ParseError> {
    let read_dir_err = |source| ParseError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let path = entry.path();

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(GO_EXTENSION) {
            continue;
        }
        if !options.include_tests && name.ends_with("_test.go") {
            continue;
        }
        if !path.is_file() {
            continue;
        }

        files.push(path);
    }

    files.sort();
    Ok(files)
}
