// =============================================================================
// FILTER DEBOUNCER MODULE
// =============================================================================
// Turns a burst of filter edits into a single commit.
//
// Each `edit` replaces the pending draft and restarts the quiet-period timer.
// When the timer elapses with a draft pending, the draft is handed to the
// commit callback (normally `store.set_filters`). `cancel` forgets the
// pending draft; dropping the debouncer stops the timer task, so nothing
// commits after the owning page is gone.
//
// Must be created inside a tokio runtime.
//
// LEARNING NOTE:
// The timer task owns all mutable state and talks to the outside only through
// an mpsc channel. `tokio::select!` waits on "next command" and "timer fired"
// at once; the `if pending.is_some()` guard disables the timer branch while
// there is nothing to commit.
// =============================================================================

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::metrics;
use crate::resource::Resource;
use crate::store::RemoteResourceStore;

/// Quiet period used when nothing else is configured.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

enum Command<F> {
    Edit(F),
    Cancel,
}

pub struct FilterDebouncer<F> {
    tx: mpsc::UnboundedSender<Command<F>>,
    task: JoinHandle<()>,
    quiet: Duration,
}

impl<F: Send + 'static> FilterDebouncer<F> {
    /// Spawns the timer task. `scope` labels the commit metric and logs.
    pub fn new<C, Fut>(quiet: Duration, scope: &'static str, commit: C) -> Self
    where
        C: Fn(F) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command<F>>();

        let task = tokio::spawn(async move {
            let mut pending: Option<F> = None;
            let timer = sleep(quiet);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(Command::Edit(draft)) => {
                            pending = Some(draft);
                            timer.as_mut().reset(Instant::now() + quiet);
                        }
                        Some(Command::Cancel) => pending = None,
                        None => break,
                    },
                    () = &mut timer, if pending.is_some() => {
                        if let Some(draft) = pending.take() {
                            metrics::record_filter_commit(scope);
                            tracing::debug!(scope, "Committing debounced filters");
                            tokio::spawn(commit(draft));
                        }
                    }
                }
            }
        });

        Self { tx, task, quiet }
    }

    /// Commits into `store` through `set_filters`, replacing the criteria.
    pub fn for_store<R>(store: RemoteResourceStore<R>, quiet: Duration) -> Self
    where
        R: Resource<Filters = F>,
    {
        Self::new(quiet, R::COLLECTION, move |draft: F| {
            let store = store.clone();
            async move {
                store.set_filters(move |filters| *filters = draft).await;
            }
        })
    }

    /// Replaces the pending draft and restarts the quiet period.
    pub fn edit(&self, draft: F) {
        if self.tx.send(Command::Edit(draft)).is_err() {
            tracing::warn!("Filter debouncer stopped, edit ignored");
        }
    }

    /// Drops the pending draft, if any.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl<F> Drop for FilterDebouncer<F> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
