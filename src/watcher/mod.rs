pub mod event;
pub mod monitor;
pub mod session;

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::{SubscriptionError, WatchError};

use event::{FsEventKind, RawEvent};
use session::EventSource;

/// [`EventSource`] backed by the platform watcher from `notify`.
///
/// The watcher delivers on its own thread; events are bridged into an
/// unbounded tokio channel so the monitor can `select!` on them.
pub struct NotifySource {
    watcher: RecommendedWatcher,
}

impl NotifySource {
    /// Start the platform watcher.
    ///
    /// # Errors
    /// [`WatchError::Init`] if the backend cannot be created (e.g. inotify
    /// instance limit reached). Nothing can be watched in that case.
    pub fn new() -> Result<(Self, UnboundedReceiver<RawEvent>), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for raw in convert_event(event) {
                        if tx.send(raw).is_err() {
                            return; // session closed
                        }
                    }
                }
                Err(err) => {
                    let _ = tx.send(RawEvent::Error(err.to_string()));
                }
            }
        })
        .map_err(|e| WatchError::Init(e.to_string()))?;

        Ok((Self { watcher }, rx))
    }
}

impl EventSource for NotifySource {
    fn add(&mut self, dir: &Path) -> Result<(), SubscriptionError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| SubscriptionError {
                dir: dir.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn remove(&mut self, dir: &Path) -> Result<(), SubscriptionError> {
        self.watcher.unwatch(dir).map_err(|e| SubscriptionError {
            dir: dir.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Map a `notify` event to one [`RawEvent`] per affected path.
///
/// Pure access events (open, read, close without write) are dropped: they
/// never indicate a change.
fn convert_event(event: notify::Event) -> Vec<RawEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FsEventKind::Create,
        EventKind::Remove(_) => FsEventKind::Remove,
        EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Rename,
        EventKind::Modify(_) | EventKind::Any => FsEventKind::Write,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => FsEventKind::Write,
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| RawEvent::Fs { path, kind })
        .collect()
}

/// Build a Gitignore matcher from the root's .gitignore file.
///
/// If no .gitignore exists, returns an empty matcher that matches nothing.
pub fn build_gitignore_matcher(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    let gitignore_path = root.join(".gitignore");
    if gitignore_path.exists() {
        let _ = builder.add(&gitignore_path);
    }
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}
