use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::error::{SubscriptionError, WatchError};
use crate::watch_set::WatchSet;

use super::event::RawEvent;

/// The subscribe/unsubscribe half of a filesystem-event backend.
///
/// Events flow separately, through the receiver handed out when the source is
/// created.
pub trait EventSource {
    /// Start a non-recursive subscription on `dir`.
    fn add(&mut self, dir: &Path) -> Result<(), SubscriptionError>;
    /// Release the subscription on `dir`.
    fn remove(&mut self, dir: &Path) -> Result<(), SubscriptionError>;
}

/// Live subscriptions plus the event stream, owned by one watch call.
///
/// Every subscription is released by [`close`](Self::close), or on drop if the
/// session is abandoned (cancelled future, panic).
pub struct WatchSession<S: EventSource> {
    source: S,
    events: UnboundedReceiver<RawEvent>,
    subscribed: Vec<PathBuf>,
}

impl<S: EventSource> WatchSession<S> {
    /// Subscribe to every directory of `watch_set`.
    ///
    /// A directory that cannot be watched is logged and skipped.
    ///
    /// # Errors
    /// [`WatchError::NoSubscriptions`] if not a single directory could be watched.
    pub fn open(
        mut source: S,
        events: UnboundedReceiver<RawEvent>,
        watch_set: &WatchSet,
    ) -> Result<Self, WatchError> {
        let mut subscribed = Vec::with_capacity(watch_set.len());

        for dir in watch_set {
            match source.add(dir) {
                Ok(()) => {
                    debug!(path = %dir.display(), "watching package directory");
                    subscribed.push(dir.clone());
                }
                Err(err) => warn!(path = %dir.display(), error = %err, "unable to watch package"),
            }
        }

        if subscribed.is_empty() {
            return Err(WatchError::NoSubscriptions {
                count: watch_set.len(),
            });
        }

        info!(
            watched = subscribed.len(),
            requested = watch_set.len(),
            "watching packages"
        );

        Ok(Self {
            source,
            events,
            subscribed,
        })
    }

    pub fn subscribed(&self) -> &[PathBuf] {
        &self.subscribed
    }

    /// Wait for the next event. `None` once the source has shut down.
    pub async fn recv(&mut self) -> Option<RawEvent> {
        self.events.recv().await
    }

    /// Take a pending event without waiting.
    pub fn try_recv(&mut self) -> Result<RawEvent, TryRecvError> {
        self.events.try_recv()
    }

    /// Release every subscription.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        for dir in std::mem::take(&mut self.subscribed) {
            if let Err(err) = self.source.remove(&dir) {
                debug!(path = %dir.display(), error = %err, "failed to release subscription");
            }
        }
        self.events.close();
    }
}

impl<S: EventSource> Drop for WatchSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}
