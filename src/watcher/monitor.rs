use std::path::Path;
use std::time::Duration;

use ignore::gitignore::Gitignore;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::error::WatchError;
use crate::watch_set::WatchSet;

use super::build_gitignore_matcher;
use super::event::{RawEvent, WatchOutcome};
use super::session::{EventSource, WatchSession};

/// Settle delay covering editors that write a file twice or touch its mtime after saving.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// How the settle delay is applied once a relevant change arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceMode {
    /// Sleep for the settle delay once, then drain.
    #[default]
    Fixed,
    /// Restart the settle delay on every further relevant event.
    Quiet,
}

/// States of one watch call. `Subscribing` is [`WatchSession::open`].
#[derive(Debug)]
enum State {
    Waiting,
    Triggered(WatchOutcome),
    Done(WatchOutcome),
}

/// Blocks until a relevant change is seen across a watch set, then returns once.
#[derive(Debug, Clone)]
pub struct ChangeMonitor {
    extension: String,
    settle: Duration,
    debounce: DebounceMode,
    timeout: Option<Duration>,
    gitignore: Option<Gitignore>,
}

impl ChangeMonitor {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_owned(),
            settle: DEFAULT_SETTLE,
            debounce: DebounceMode::Fixed,
            timeout: None,
            gitignore: None,
        }
    }

    pub fn from_config(config: &Config, root: &Path) -> Self {
        let mut monitor = Self::new(config.normalized_extension())
            .with_settle(config.settle())
            .with_debounce(config.debounce)
            .with_timeout(config.timeout());
        if config.respect_gitignore {
            monitor = monitor.with_gitignore(build_gitignore_matcher(root));
        }
        monitor
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_debounce(mut self, debounce: DebounceMode) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_gitignore(mut self, gitignore: Gitignore) -> Self {
        self.gitignore = Some(gitignore);
        self
    }

    /// Subscribe to `watch_set` and return after the first debounced relevant change.
    ///
    /// All subscriptions are released before this returns, whatever the outcome.
    ///
    /// # Errors
    /// Only setup failures: [`WatchError::NoSubscriptions`] when no directory
    /// could be watched.
    pub async fn run<S: EventSource>(
        &self,
        source: S,
        events: UnboundedReceiver<RawEvent>,
        watch_set: &WatchSet,
        cancel: &CancellationToken,
    ) -> Result<WatchOutcome, WatchError> {
        let mut session = WatchSession::open(source, events, watch_set)?;
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let mut state = State::Waiting;
        loop {
            trace!(?state, "monitor state");
            state = match state {
                State::Waiting => self.wait(&mut session, cancel, deadline).await,
                State::Triggered(outcome) => {
                    self.settle(&mut session, cancel, deadline, outcome).await
                }
                State::Done(outcome) => {
                    session.close();
                    return Ok(outcome);
                }
            };
        }
    }

    /// Waiting: block until a relevant event, an error, cancellation or the deadline.
    async fn wait<S: EventSource>(
        &self,
        session: &mut WatchSession<S>,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> State {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return State::Done(WatchOutcome::Cancelled),
                _ = until(deadline) => return State::Done(WatchOutcome::TimedOut),
                event = session.recv() => event,
            };

            match event {
                None => return State::Done(WatchOutcome::StreamClosed),
                Some(RawEvent::Error(message)) => {
                    info!(error = %message, "watcher error, treating as change");
                    return State::Triggered(WatchOutcome::StreamError(message));
                }
                Some(RawEvent::Fs { path, kind }) => {
                    if self.is_relevant(&path) {
                        info!(path = %path.display(), ?kind, "change detected");
                        return State::Triggered(WatchOutcome::Changed(path));
                    }
                    trace!(path = %path.display(), ?kind, "ignoring event");
                }
            }
        }
    }

    /// Triggered: let the burst settle, then discard whatever is pending.
    ///
    /// The overall deadline cuts the settle short but keeps the outcome.
    async fn settle<S: EventSource>(
        &self,
        session: &mut WatchSession<S>,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
        outcome: WatchOutcome,
    ) -> State {
        let settled = match self.debounce {
            DebounceMode::Fixed => {
                tokio::select! {
                    _ = cancel.cancelled() => false,
                    _ = until(deadline) => true,
                    _ = sleep(self.settle) => true,
                }
            }
            DebounceMode::Quiet => self.quiet_period(session, cancel, deadline).await,
        };
        if !settled {
            return State::Done(WatchOutcome::Cancelled);
        }

        let mut drained = 0usize;
        while session.try_recv().is_ok() {
            drained += 1;
        }
        debug!(drained, "discarded follow-up events");

        State::Done(outcome)
    }

    /// Wait until no relevant event has arrived for a full settle delay.
    ///
    /// Returns false if cancelled. Reaching `deadline` ends the wait early.
    async fn quiet_period<S: EventSource>(
        &self,
        session: &mut WatchSession<S>,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> bool {
        let mut quiet_until = Instant::now() + self.settle;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = until(deadline) => {
                    debug!("deadline reached while settling");
                    return true;
                }
                _ = sleep_until(quiet_until) => return true,
                event = session.recv() => match event {
                    None => return true,
                    Some(RawEvent::Error(_)) => quiet_until = Instant::now() + self.settle,
                    Some(RawEvent::Fs { path, .. }) => {
                        if self.is_relevant(&path) {
                            quiet_until = Instant::now() + self.settle;
                        }
                    }
                },
            }
        }
    }

    /// True if a change to `path` should wake the caller.
    pub fn is_relevant(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != self.extension {
            return false;
        }
        match &self.gitignore {
            Some(gitignore) if path.starts_with(gitignore.path()) => {
                !gitignore.matched(path, false).is_ignore()
            }
            _ => true,
        }
    }
}

/// Resolves at `deadline`, or never.
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
