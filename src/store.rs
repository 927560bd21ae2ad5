// =============================================================================
// RESOURCE STORE MODULE
// =============================================================================
// Client-side mirror of one remote collection plus its loading, error,
// filter and pagination metadata.
//
// RULES:
// - Every fetch takes the next sequence number; a response is applied only
//   if no newer fetch was issued meanwhile (stale responses are dropped)
// - A failed read empties the collection and records the error
// - Writes never merge locally; success triggers a refetch
// - Filter changes send the cursor back to page 1 before refetching
//
// State sits behind a std Mutex that is never held across an await.
//
// LEARNING NOTES:
// - A std MutexGuard is not Send, so holding one across `.await` would make
//   the future unusable with `tokio::spawn`. Every method locks, copies what it
//   needs out, drops the guard, and only then awaits.
// - The store is a cheap handle (`Arc` inside); clones share one collection,
//   which is how the debouncer task commits into the page's store.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ClientError, ClientResult};
use crate::metrics;
use crate::notify::Notifier;
use crate::pagination::PaginationState;
use crate::resource::Resource;
use crate::source::{DataOrigin, DataSource, ListQuery};
use crate::storage::{load_json, save_json, snapshot_key, KeyValueStore};

/// Result of one `fetch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied to the store
    Applied { count: usize, origin: DataOrigin },
    /// A newer fetch was issued before this one resolved; response dropped
    Superseded,
    /// The read failed; the store is empty and carries the error
    Failed,
}

/// Read-only copy of a store's state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot<E, F> {
    pub items: Vec<E>,
    pub loading: bool,
    pub error: Option<String>,
    pub filters: F,
    pub pagination: PaginationState,
    pub origin: Option<DataOrigin>,
}

/// Durable form of the last applied collection.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCollection<E> {
    items: Vec<E>,
    total: u64,
}

struct StoreState<R: Resource> {
    items: Vec<R::Entity>,
    loading: bool,
    error: Option<String>,
    filters: R::Filters,
    pagination: PaginationState,
    origin: Option<DataOrigin>,
}

struct StoreInner<R: Resource> {
    source: Arc<dyn DataSource<R>>,
    state: Mutex<StoreState<R>>,
    seq: AtomicU64,
    notifier: Notifier,
    page_size: u32,
    snapshots: Option<Arc<dyn KeyValueStore>>,
}

// =============================================================================
// STORE
// =============================================================================
/// Clones share the same state.
pub struct RemoteResourceStore<R: Resource> {
    inner: Arc<StoreInner<R>>,
}

impl<R: Resource> Clone for RemoteResourceStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> RemoteResourceStore<R> {
    pub fn new(source: Arc<dyn DataSource<R>>, notifier: Notifier, page_size: u32) -> Self {
        Self::build(source, notifier, page_size, None)
    }

    /// Like `new`, but restores the last applied collection from `kv` and
    /// saves every remote page it applies.
    pub async fn with_snapshot(
        source: Arc<dyn DataSource<R>>,
        notifier: Notifier,
        page_size: u32,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        let restored =
            match load_json::<PersistedCollection<R::Entity>>(kv.as_ref(), &Self::snapshot_key()).await {
                Ok(saved) => saved,
                Err(err) => {
                    tracing::warn!(resource = R::COLLECTION, error = %err, "Ignoring unreadable snapshot");
                    None
                }
            };

        let store = Self::build(source, notifier, page_size, Some(kv));
        if let Some(saved) = restored {
            tracing::debug!(
                resource = R::COLLECTION,
                count = saved.items.len(),
                "Restored collection snapshot"
            );
            let mut state = store.state();
            state.items = saved.items;
            state.pagination.set_total(saved.total);
            state.origin = Some(DataOrigin::Snapshot);
        }
        store
    }

    fn build(
        source: Arc<dyn DataSource<R>>,
        notifier: Notifier,
        page_size: u32,
        snapshots: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let state = StoreState {
            items: Vec::new(),
            loading: false,
            error: None,
            filters: R::Filters::default(),
            pagination: PaginationState::new(page_size),
            origin: None,
        };

        Self {
            inner: Arc::new(StoreInner {
                source,
                state: Mutex::new(state),
                seq: AtomicU64::new(0),
                notifier,
                page_size: page_size.max(1),
                snapshots,
            }),
        }
    }

    fn snapshot_key() -> String {
        snapshot_key(R::COLLECTION)
    }

    fn state(&self) -> MutexGuard<'_, StoreState<R>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // ACCESSORS
    // -------------------------------------------------------------------------

    pub fn resource(&self) -> &'static str {
        R::COLLECTION
    }

    pub fn snapshot(&self) -> StoreSnapshot<R::Entity, R::Filters> {
        let state = self.state();
        StoreSnapshot {
            items: state.items.clone(),
            loading: state.loading,
            error: state.error.clone(),
            filters: state.filters.clone(),
            pagination: state.pagination,
            origin: state.origin,
        }
    }

    pub fn items(&self) -> Vec<R::Entity> {
        self.state().items.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn filters(&self) -> R::Filters {
        self.state().filters.clone()
    }

    pub fn pagination(&self) -> PaginationState {
        self.state().pagination
    }

    pub fn origin(&self) -> Option<DataOrigin> {
        self.state().origin
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    // -------------------------------------------------------------------------
    // READS
    // -------------------------------------------------------------------------

    /// Reads the page selected by the current filters and cursor.
    ///
    /// When the response moves the cursor (the total shrank below the
    /// requested page), the clamped page is read once more so the items
    /// always belong to the page the cursor shows.
    pub async fn fetch(&self) -> FetchOutcome {
        let (outcome, moved) = self.fetch_page().await;
        if moved {
            tracing::debug!(resource = R::COLLECTION, "Cursor clamped, reading the new page");
            return self.fetch_page().await.0;
        }
        outcome
    }

    /// One list round-trip. The flag is true when the applied response
    /// clamped the cursor away from the page that was requested.
    async fn fetch_page(&self) -> (FetchOutcome, bool) {
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let mut state = self.state();
            state.loading = true;
            ListQuery {
                filters: state.filters.clone(),
                page: state.pagination.page,
                limit: state.pagination.page_size,
            }
        };
        tracing::debug!(resource = R::COLLECTION, seq, page = query.page, "Fetching");

        let result = self.inner.source.list(&query).await;

        let (outcome, moved, persist, failure) = {
            let mut state = self.state();
            if self.inner.seq.load(Ordering::SeqCst) != seq {
                (FetchOutcome::Superseded, false, None, None)
            } else {
                state.loading = false;
                match result {
                    Ok(page) => {
                        let count = page.items.len();
                        state.items = page.items;
                        state.pagination.page = page.page.max(1);
                        state.pagination.set_total(page.total);
                        state.error = None;
                        state.origin = Some(page.origin);
                        metrics::set_store_items(R::COLLECTION, count);

                        // set_total clamps the cursor; compare with what was asked for
                        let moved = page.total > 0 && state.pagination.page != query.page;
                        let persist = (page.origin == DataOrigin::Remote && !moved).then(|| {
                            PersistedCollection {
                                items: state.items.clone(),
                                total: page.total,
                            }
                        });
                        (
                            FetchOutcome::Applied {
                                count,
                                origin: page.origin,
                            },
                            moved,
                            persist,
                            None,
                        )
                    }
                    Err(err) => {
                        let message = err.to_string();
                        state.items.clear();
                        state.error = Some(message.clone());
                        state.origin = None;
                        metrics::set_store_items(R::COLLECTION, 0);
                        (FetchOutcome::Failed, false, None, Some(message))
                    }
                }
            }
        };

        match outcome {
            FetchOutcome::Applied { count, origin } => {
                metrics::record_store_fetch(R::COLLECTION, "applied");
                tracing::debug!(resource = R::COLLECTION, seq, count, ?origin, "Fetch applied");
            }
            FetchOutcome::Superseded => {
                metrics::record_store_fetch(R::COLLECTION, "superseded");
                tracing::debug!(resource = R::COLLECTION, seq, "Dropping stale response");
            }
            FetchOutcome::Failed => {
                metrics::record_store_fetch(R::COLLECTION, "failed");
            }
        }

        if let Some(message) = failure {
            tracing::warn!(resource = R::COLLECTION, seq, error = %message, "Fetch failed");
            self.inner
                .notifier
                .error(non_empty(message, || format!("Failed to fetch {}", R::COLLECTION)));
        }
        if let (Some(collection), Some(kv)) = (persist, &self.inner.snapshots) {
            if let Err(err) = save_json(kv.as_ref(), &Self::snapshot_key(), &collection).await {
                tracing::warn!(resource = R::COLLECTION, error = %err, "Failed to save snapshot");
            }
        }
        (outcome, moved)
    }

    /// Fetches a single entity. Failure sets `error` and yields `None`.
    pub async fn get_by_id(&self, id: &str) -> Option<R::Entity> {
        match self.inner.source.get(id).await {
            Ok(entity) => Some(entity),
            Err(err) => {
                tracing::warn!(resource = R::COLLECTION, id = %id, error = %err, "Get failed");
                self.state().error = Some(err.to_string());
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // WRITES
    // -------------------------------------------------------------------------

    pub async fn create(&self, mut draft: R::Draft) -> ClientResult<R::Entity> {
        R::normalize_draft(&mut draft);
        R::validate_draft(&draft)?;
        self.begin_write();

        match self.inner.source.create(&draft).await {
            Ok(entity) => {
                self.write_succeeded("create", "created", R::id(&entity)).await;
                Ok(entity)
            }
            Err(err) => Err(self.write_failed("create", err)),
        }
    }

    pub async fn update(&self, id: &str, patch: R::Patch) -> ClientResult<R::Entity> {
        R::validate_patch(&patch)?;
        self.begin_write();

        match self.inner.source.update(id, &patch).await {
            Ok(entity) => {
                self.write_succeeded("update", "updated", id).await;
                Ok(entity)
            }
            Err(err) => Err(self.write_failed("update", err)),
        }
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.begin_write();

        match self.inner.source.delete(id).await {
            Ok(()) => {
                self.write_succeeded("delete", "deleted", id).await;
                Ok(())
            }
            Err(err) => Err(self.write_failed("delete", err)),
        }
    }

    fn begin_write(&self) {
        let mut state = self.state();
        state.loading = true;
        state.error = None;
    }

    async fn write_succeeded(&self, operation: &str, past: &str, id: &str) {
        metrics::record_store_write(R::COLLECTION, operation, true);
        tracing::info!(resource = R::COLLECTION, operation, id = %id, "Write succeeded");
        self.inner
            .notifier
            .success(format!("{} {} successfully", R::LABEL, past));
        self.fetch().await;
    }

    fn write_failed(&self, operation: &str, err: ClientError) -> ClientError {
        let message = err.to_string();
        {
            let mut state = self.state();
            state.loading = false;
            state.error = Some(message.clone());
        }
        metrics::record_store_write(R::COLLECTION, operation, false);
        tracing::warn!(resource = R::COLLECTION, operation, error = %message, "Write failed");
        self.inner.notifier.error(non_empty(message, || {
            format!("Failed to {} {}", operation, R::LABEL)
        }));
        err
    }

    // -------------------------------------------------------------------------
    // CRITERIA
    // -------------------------------------------------------------------------

    /// Edits the filters in place, returns to page 1 and refetches.
    pub async fn set_filters<F>(&self, update: F) -> FetchOutcome
    where
        F: FnOnce(&mut R::Filters),
    {
        {
            let mut state = self.state();
            update(&mut state.filters);
            state.pagination.reset_page();
        }
        self.fetch().await
    }

    /// Edits the cursor (page, page size) and refetches.
    pub async fn set_pagination<F>(&self, update: F) -> FetchOutcome
    where
        F: FnOnce(&mut PaginationState),
    {
        {
            let mut state = self.state();
            update(&mut state.pagination);
            state.pagination.page = state.pagination.page.max(1);
            state.pagination.page_size = state.pagination.page_size.max(1);
        }
        self.fetch().await
    }

    /// Default filters, first page, configured page size; then refetches.
    pub async fn reset_filters(&self) -> FetchOutcome {
        {
            let mut state = self.state();
            state.filters = R::Filters::default();
            state.pagination = PaginationState::new(self.inner.page_size);
        }
        self.fetch().await
    }
}

fn non_empty(message: String, fallback: impl FnOnce() -> String) -> String {
    if message.trim().is_empty() {
        fallback()
    } else {
        message
    }
}
