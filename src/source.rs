// =============================================================================
// DATA SOURCE MODULE
// =============================================================================
// Where a store's rows come from.
//
// TIERS:
// - RemoteSource:  the REST API (system of record)
// - FixtureSource: an in-memory copy of the static fixtures, writable so the
//                  panel stays usable offline
//
// TieredSource puts both behind one interface and picks a tier according to
// a SourceStrategy. Under `RemoteWithFallback` a read that fails for a
// network reason is answered by the fixture tier; writes never fall back.
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::filters::EntityFilter;
use crate::fixtures;
use crate::notify::Notifier;
use crate::resource::{Resource, UpdateVerb};

// =============================================================================
// QUERY AND RESULT TYPES
// =============================================================================

/// Parameters of one list read.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    pub filters: F,
    pub page: u32,
    pub limit: u32,
}

/// Which tier produced the rows a store currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Remote,
    Fixture,
    /// Restored from durable storage at boot
    Snapshot,
}

/// One page of a collection, already in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub origin: DataOrigin,
}

// =============================================================================
// DATA SOURCE TRAIT
// =============================================================================
#[async_trait]
pub trait DataSource<R: Resource>: Send + Sync {
    async fn list(&self, query: &ListQuery<R::Filters>) -> ClientResult<SourcePage<R::Entity>>;

    async fn get(&self, id: &str) -> ClientResult<R::Entity>;

    async fn create(&self, draft: &R::Draft) -> ClientResult<R::Entity>;

    async fn update(&self, id: &str, patch: &R::Patch) -> ClientResult<R::Entity>;

    async fn delete(&self, id: &str) -> ClientResult<()>;
}

// =============================================================================
// REMOTE TIER
// =============================================================================
pub struct RemoteSource<R> {
    api: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> RemoteSource<R> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> DataSource<R> for RemoteSource<R> {
    async fn list(&self, query: &ListQuery<R::Filters>) -> ClientResult<SourcePage<R::Entity>> {
        let envelope = self
            .api
            .list::<R::Entity>(R::PATH, &query.filters.query_pairs(), query.page, query.limit)
            .await?;
        Ok(SourcePage {
            items: envelope.data,
            total: envelope.total,
            page: envelope.page,
            origin: DataOrigin::Remote,
        })
    }

    async fn get(&self, id: &str) -> ClientResult<R::Entity> {
        self.api.get(&R::item_path(id), R::ITEM_ROUTE).await
    }

    async fn create(&self, draft: &R::Draft) -> ClientResult<R::Entity> {
        self.api.post(R::PATH, R::PATH, draft).await
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> ClientResult<R::Entity> {
        let path = R::item_path(id);
        match R::UPDATE_VERB {
            UpdateVerb::Put => self.api.put(&path, R::ITEM_ROUTE, patch).await,
            UpdateVerb::Patch => self.api.patch(&path, R::ITEM_ROUTE, patch).await,
        }
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.api.delete(&R::item_path(id), R::ITEM_ROUTE).await
    }
}

// =============================================================================
// FIXTURE TIER
// =============================================================================
/// Writable in-memory collection seeded from the fixtures.
pub struct FixtureSource<R: Resource> {
    rows: Mutex<Vec<R::Entity>>,
}

impl<R: Resource> FixtureSource<R> {
    pub fn new() -> Self {
        Self::with_rows(R::fixtures())
    }

    pub fn with_rows(rows: Vec<R::Entity>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn not_found(id: &str) -> ClientError {
        ClientError::NotFound(format!("{} {}", R::LABEL, id))
    }
}

impl<R: Resource> Default for FixtureSource<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> DataSource<R> for FixtureSource<R> {
    async fn list(&self, query: &ListQuery<R::Filters>) -> ClientResult<SourcePage<R::Entity>> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<&R::Entity> = rows.iter().filter(|e| query.filters.matches(e)).collect();

        let limit = query.limit.max(1) as usize;
        let page = query.page.max(1);
        let items = matching
            .iter()
            .skip((page as usize - 1) * limit)
            .take(limit)
            .map(|e| (*e).clone())
            .collect();

        Ok(SourcePage {
            items,
            total: matching.len() as u64,
            page,
            origin: DataOrigin::Fixture,
        })
    }

    async fn get(&self, id: &str) -> ClientResult<R::Entity> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.iter()
            .find(|e| R::id(e) == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, draft: &R::Draft) -> ClientResult<R::Entity> {
        let entity = R::materialize(Uuid::new_v4().to_string(), draft, Utc::now());
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> ClientResult<R::Entity> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let entity = rows
            .iter_mut()
            .find(|e| R::id(e) == id)
            .ok_or_else(|| Self::not_found(id))?;
        R::apply_patch(entity, patch, Utc::now());
        Ok(entity.clone())
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|e| R::id(e) != id);
        if rows.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

// =============================================================================
// STRATEGY
// =============================================================================
/// Tier selection, configured with `DATA_SOURCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStrategy {
    /// Only the API; failures surface as errors
    RemoteOnly,
    /// Only the fixture tier; never touches the network
    FixtureOnly,
    /// API first, fixture tier for reads that fail on the network
    RemoteWithFallback,
}

impl SourceStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceStrategy::RemoteOnly => "remote",
            SourceStrategy::FixtureOnly => "fixture",
            SourceStrategy::RemoteWithFallback => "fallback",
        }
    }
}

impl fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceStrategy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(SourceStrategy::RemoteOnly),
            "fixture" => Ok(SourceStrategy::FixtureOnly),
            "fallback" => Ok(SourceStrategy::RemoteWithFallback),
            other => Err(format!(
                "unknown data source '{other}' (expected remote, fixture or fallback)"
            )),
        }
    }
}

// =============================================================================
// TIERED SOURCE
// =============================================================================
pub struct TieredSource<R: Resource> {
    remote: Arc<dyn DataSource<R>>,
    fixture: Arc<FixtureSource<R>>,
    strategy: SourceStrategy,
    notifier: Notifier,
}

impl<R: Resource> TieredSource<R> {
    pub fn new(
        remote: Arc<dyn DataSource<R>>,
        fixture: Arc<FixtureSource<R>>,
        strategy: SourceStrategy,
        notifier: Notifier,
    ) -> Self {
        Self {
            remote,
            fixture,
            strategy,
            notifier,
        }
    }

    pub fn strategy(&self) -> SourceStrategy {
        self.strategy
    }

    fn writes(&self) -> &dyn DataSource<R> {
        match self.strategy {
            SourceStrategy::FixtureOnly => self.fixture.as_ref(),
            SourceStrategy::RemoteOnly | SourceStrategy::RemoteWithFallback => self.remote.as_ref(),
        }
    }

    fn should_fall_back(&self, err: &ClientError) -> bool {
        self.strategy == SourceStrategy::RemoteWithFallback && err.allows_fallback()
    }
}

#[async_trait]
impl<R: Resource> DataSource<R> for TieredSource<R> {
    async fn list(&self, query: &ListQuery<R::Filters>) -> ClientResult<SourcePage<R::Entity>> {
        if self.strategy == SourceStrategy::FixtureOnly {
            return self.fixture.list(query).await;
        }
        match self.remote.list(query).await {
            Ok(page) => Ok(page),
            Err(err) if self.should_fall_back(&err) => {
                tracing::warn!(
                    resource = R::COLLECTION,
                    error = %err,
                    "Remote list failed, serving fixture data"
                );
                self.notifier
                    .warning(format!("Offline: showing sample {}", R::COLLECTION));
                self.fixture.list(query).await
            }
            Err(err) => Err(err),
        }
    }

    async fn get(&self, id: &str) -> ClientResult<R::Entity> {
        if self.strategy == SourceStrategy::FixtureOnly {
            return self.fixture.get(id).await;
        }
        match self.remote.get(id).await {
            Ok(entity) => Ok(entity),
            Err(err) if self.should_fall_back(&err) => {
                tracing::warn!(resource = R::COLLECTION, id = %id, error = %err, "Remote get failed, trying fixture data");
                self.fixture.get(id).await
            }
            Err(err) => Err(err),
        }
    }

    async fn create(&self, draft: &R::Draft) -> ClientResult<R::Entity> {
        self.writes().create(draft).await
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> ClientResult<R::Entity> {
        self.writes().update(id, patch).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.writes().delete(id).await
    }
}

// =============================================================================
// LOOKUPS
// =============================================================================
/// Option lists for the filter forms (attribute types, categories, brands).
#[derive(Clone)]
pub struct CatalogLookups {
    api: ApiClient,
    strategy: SourceStrategy,
}

impl CatalogLookups {
    pub fn new(api: ApiClient, strategy: SourceStrategy) -> Self {
        Self { api, strategy }
    }

    pub async fn attribute_types(&self) -> ClientResult<Vec<String>> {
        let api = self.api.clone();
        self.resolve("attribute types", fixtures::attribute_types, || async move {
            api.attribute_types().await
        })
        .await
    }

    pub async fn product_categories(&self) -> ClientResult<Vec<String>> {
        let api = self.api.clone();
        self.resolve("product categories", fixtures::product_categories, || async move {
            api.product_categories().await
        })
        .await
    }

    pub async fn product_brands(&self) -> ClientResult<Vec<String>> {
        let api = self.api.clone();
        self.resolve("product brands", fixtures::product_brands, || async move {
            api.product_brands().await
        })
        .await
    }

    async fn resolve<L, Fut>(
        &self,
        what: &str,
        fixture: fn() -> Vec<String>,
        load: L,
    ) -> ClientResult<Vec<String>>
    where
        L: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ClientResult<Vec<String>>>,
    {
        if self.strategy == SourceStrategy::FixtureOnly {
            return Ok(fixture());
        }
        match load().await {
            Ok(list) => Ok(list),
            Err(err)
                if self.strategy == SourceStrategy::RemoteWithFallback && err.allows_fallback() =>
            {
                tracing::warn!(lookup = what, error = %err, "Lookup failed, using fixture list");
                Ok(fixture())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{AttributeFilters, SkuFilters, StockLevel};
    use crate::models::{AttributeType, SkuDraft, SkuPatch};
    use crate::notify::{drain, NotificationLevel};
    use crate::resource::{Attributes, Skus};

    /// Remote tier that always fails with the given error.
    struct Unreachable(fn() -> ClientError);

    #[async_trait]
    impl<R: Resource> DataSource<R> for Unreachable {
        async fn list(&self, _: &ListQuery<R::Filters>) -> ClientResult<SourcePage<R::Entity>> {
            Err((self.0)())
        }
        async fn get(&self, _: &str) -> ClientResult<R::Entity> {
            Err((self.0)())
        }
        async fn create(&self, _: &R::Draft) -> ClientResult<R::Entity> {
            Err((self.0)())
        }
        async fn update(&self, _: &str, _: &R::Patch) -> ClientResult<R::Entity> {
            Err((self.0)())
        }
        async fn delete(&self, _: &str) -> ClientResult<()> {
            Err((self.0)())
        }
    }

    fn server_down() -> ClientError {
        ClientError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        }
    }

    fn forbidden() -> ClientError {
        ClientError::Unauthorized("Invalid token".into())
    }

    fn query<F: Default>(page: u32, limit: u32) -> ListQuery<F> {
        ListQuery {
            filters: F::default(),
            page,
            limit,
        }
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "Fallback".parse::<SourceStrategy>(),
            Ok(SourceStrategy::RemoteWithFallback)
        );
        assert_eq!("fixture".parse::<SourceStrategy>(), Ok(SourceStrategy::FixtureOnly));
        assert_eq!("remote".parse::<SourceStrategy>(), Ok(SourceStrategy::RemoteOnly));
        assert!("mock".parse::<SourceStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_fixture_paging_and_filtering() {
        let source = FixtureSource::<Skus>::new();
        let page = source.list(&query::<SkuFilters>(2, 2)).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, "sku-3");
        assert_eq!(page.origin, DataOrigin::Fixture);

        let filtered = ListQuery {
            filters: SkuFilters {
                stock_level: Some(StockLevel::OutOfStock),
                ..Default::default()
            },
            page: 1,
            limit: 10,
        };
        let page = source.list(&filtered).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].model, "MUG-RED");
    }

    #[tokio::test]
    async fn test_fixture_writes() {
        let source = FixtureSource::<Skus>::new();
        let created = source
            .create(&SkuDraft {
                model: "NEW-1".into(),
                price: "10".into(),
                number_in_stock: "1".into(),
            })
            .await
            .unwrap();
        assert_eq!(source.len(), 6);

        let patch = SkuPatch {
            price: Some("11".into()),
            ..Default::default()
        };
        let updated = source.update(&created.id, &patch).await.unwrap();
        assert_eq!(updated.price, "11");

        source.delete(&created.id).await.unwrap();
        assert!(matches!(
            source.delete(&created.id).await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_serves_fixture_and_warns() {
        let notifier = Notifier::new();
        let mut rx = notifier.observer();
        let tiered = TieredSource::<Attributes>::new(
            Arc::new(Unreachable(server_down)),
            Arc::new(FixtureSource::new()),
            SourceStrategy::RemoteWithFallback,
            notifier,
        );

        let filters = AttributeFilters {
            attr_type: Some(AttributeType::Dropdown),
            ..Default::default()
        };
        let page = tiered
            .list(&ListQuery {
                filters,
                page: 1,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.origin, DataOrigin::Fixture);
        assert_eq!(page.total, 2);

        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Warning);
    }

    #[tokio::test]
    async fn test_no_fallback_for_auth_errors_or_writes() {
        let tiered = TieredSource::<Skus>::new(
            Arc::new(Unreachable(forbidden)),
            Arc::new(FixtureSource::new()),
            SourceStrategy::RemoteWithFallback,
            Notifier::new(),
        );
        assert!(matches!(
            tiered.list(&query(1, 10)).await,
            Err(ClientError::Unauthorized(_))
        ));

        let tiered = TieredSource::<Skus>::new(
            Arc::new(Unreachable(server_down)),
            Arc::new(FixtureSource::new()),
            SourceStrategy::RemoteWithFallback,
            Notifier::new(),
        );
        assert!(tiered.delete("sku-1").await.is_err());
        assert!(tiered.get("sku-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_remote_only_and_fixture_only() {
        let remote_only = TieredSource::<Skus>::new(
            Arc::new(Unreachable(server_down)),
            Arc::new(FixtureSource::new()),
            SourceStrategy::RemoteOnly,
            Notifier::new(),
        );
        assert!(remote_only.list(&query(1, 10)).await.is_err());

        let fixture = Arc::new(FixtureSource::<Skus>::new());
        let fixture_only = TieredSource::<Skus>::new(
            Arc::new(Unreachable(server_down)),
            fixture.clone(),
            SourceStrategy::FixtureOnly,
            Notifier::new(),
        );
        fixture_only.delete("sku-1").await.unwrap();
        assert_eq!(fixture.len(), 4);
    }
}
