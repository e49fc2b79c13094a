use std::path::PathBuf;

use thiserror::Error;

/// Failure to extract the import set of a package directory.
///
/// Always fatal for a watch call: an unparsable root package cannot be
/// meaningfully watched.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The package directory is missing or cannot be listed.
    #[error("cannot read package directory {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file inside the package could not be read.
    #[error("cannot read {file}: {source}")]
    ReadFile {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The package clause or an import declaration is syntactically broken.
    #[error("{file}:{line}: syntax error in {context}")]
    Syntax {
        file: PathBuf,
        line: usize,
        context: &'static str,
    },

    /// The directory holds no source files at all.
    #[error("no buildable Go source files in {dir}")]
    NoSourceFiles { dir: PathBuf },

    /// The tree-sitter grammar could not be loaded.
    #[error("failed to load Go grammar: {0}")]
    Grammar(String),
}

/// A single directory could not be subscribed to or released.
///
/// Never fatal on its own; the session logs it and moves on.
#[derive(Debug, Error)]
#[error("cannot watch {dir}: {message}")]
pub struct SubscriptionError {
    pub dir: PathBuf,
    pub message: String,
}

/// Setup failures of a watch call. Returned before any change is awaited.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The filesystem-event backend itself failed to start.
    #[error("failed to initialise filesystem watcher: {0}")]
    Init(String),

    /// Every directory of the watch set failed to subscribe.
    #[error("none of the {count} package directories could be watched")]
    NoSubscriptions { count: usize },

    /// The blocking entry point could not build its runtime.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
