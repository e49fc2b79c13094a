use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Watch a Go package and the non-std packages it imports.
///
/// pkgwatch returns once any watched `.go` file changes, so a shell loop can
/// rebuild and re-run on every edit, including edits to imported packages.
#[derive(Parser, Debug)]
#[command(
    name = "pkgwatch",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log resolution and watch details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Block until the package or one of its imports changes, then exit.
    ///
    /// Exit status: 0 after a change (or a watcher error), 1 if the watch
    /// could not be set up, 2 on timeout or Ctrl-C.
    Watch {
        /// Directory of the Go package to watch.
        path: PathBuf,

        /// Extension of files whose changes count (default: go).
        #[arg(long)]
        ext: Option<String>,

        /// Settle delay after the first change, in milliseconds (default: 100).
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Give up after this many seconds without a change.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Wait for a full quiet period instead of a single fixed delay.
        #[arg(long)]
        quiet_debounce: bool,

        /// Output the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the directories that `watch` would subscribe to, without watching.
    Deps {
        /// Directory of the Go package.
        path: PathBuf,

        /// Output the watch plan as JSON.
        #[arg(long)]
        json: bool,
    },
}
