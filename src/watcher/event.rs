use std::path::PathBuf;

use serde::Serialize;

/// Kind of a raw filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Write,
    Remove,
    Rename,
}

/// One notification delivered by an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A change to `path`.
    Fs { path: PathBuf, kind: FsEventKind },
    /// The backend reported an error; the watch may no longer be reliable.
    Error(String),
}

impl RawEvent {
    pub fn fs(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        RawEvent::Fs {
            path: path.into(),
            kind,
        }
    }
}

/// Why a watch call returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum WatchOutcome {
    /// A relevant file changed. Holds the path of the first relevant event.
    Changed(PathBuf),
    /// The event stream reported an error, treated like a change.
    StreamError(String),
    /// The event source went away while waiting.
    StreamClosed,
    /// The caller cancelled the watch.
    Cancelled,
    /// No relevant change arrived before the configured timeout.
    TimedOut,
}

impl WatchOutcome {
    /// True for outcomes after which the caller should rebuild.
    pub fn should_rebuild(&self) -> bool {
        matches!(self, WatchOutcome::Changed(_) | WatchOutcome::StreamError(_))
    }
}
