// =============================================================================
// APPLICATION MODULE
// =============================================================================
// Composition root. Wires, in order:
//   config -> storage -> session -> API client -> data sources -> stores
//
// The session handle is created once and injected into both the API client
// (bearer header, 401 expiry) and the router guard (`navigate`).
// =============================================================================

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::ClientResult;
use crate::notify::Notifier;
use crate::pages::ResourcePage;
use crate::resource::{Attributes, Products, Resource, Skus};
use crate::router::{self, Route};
use crate::session::{AuthSession, SessionHandle};
use crate::source::{CatalogLookups, DataSource, FixtureSource, RemoteSource, TieredSource};
use crate::storage::{open_store, KeyValueStore};
use crate::store::RemoteResourceStore;

pub struct AdminApp {
    config: Config,
    notifier: Notifier,
    api: ApiClient,
    auth: AuthSession,
    lookups: CatalogLookups,
    pub attributes: RemoteResourceStore<Attributes>,
    pub products: RemoteResourceStore<Products>,
    pub skus: RemoteResourceStore<Skus>,
}

impl AdminApp {
    /// Opens the configured storage backend and builds the app on it.
    pub async fn bootstrap(config: &Config) -> ClientResult<Self> {
        let storage = open_store(&config.storage_url).await?;
        Self::with_storage(config, storage).await
    }

    pub async fn with_storage(config: &Config, storage: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        let notifier = Notifier::new();
        let session = SessionHandle::restore(storage.clone()).await?;
        let api = ApiClient::new(
            &config.api_base_url,
            config.request_timeout,
            session.clone(),
            notifier.clone(),
        )?;

        tracing::info!(
            api = %config.api_base_url,
            data_source = %config.data_source,
            logged_in = session.is_logged_in(),
            "Catalog admin bootstrapped"
        );

        Ok(Self {
            attributes: build_store(config, &api, &storage, &notifier).await,
            products: build_store(config, &api, &storage, &notifier).await,
            skus: build_store(config, &api, &storage, &notifier).await,
            lookups: CatalogLookups::new(api.clone(), config.data_source),
            auth: AuthSession::new(api.clone(), session),
            config: config.clone(),
            notifier,
            api,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn session(&self) -> &SessionHandle {
        self.auth.handle()
    }

    pub fn lookups(&self) -> &CatalogLookups {
        &self.lookups
    }

    /// Route to mount for `path` given the current session.
    pub fn navigate(&self, path: &str) -> Route {
        router::mount_target(path, self.auth.state())
    }

    pub fn attributes_page(&self) -> ResourcePage<Attributes> {
        ResourcePage::new(self.attributes.clone(), self.config.filter_debounce)
    }

    pub fn products_page(&self) -> ResourcePage<Products> {
        ResourcePage::new(self.products.clone(), self.config.filter_debounce)
    }

    pub fn skus_page(&self) -> ResourcePage<Skus> {
        ResourcePage::new(self.skus.clone(), self.config.filter_debounce)
    }
}

async fn build_store<R: Resource>(
    config: &Config,
    api: &ApiClient,
    storage: &Arc<dyn KeyValueStore>,
    notifier: &Notifier,
) -> RemoteResourceStore<R> {
    let source: Arc<dyn DataSource<R>> = Arc::new(TieredSource::new(
        Arc::new(RemoteSource::<R>::new(api.clone())),
        Arc::new(FixtureSource::<R>::new()),
        config.data_source,
        notifier.clone(),
    ));
    if config.persist_snapshots {
        RemoteResourceStore::with_snapshot(source, notifier.clone(), config.page_size, storage.clone())
            .await
    } else {
        RemoteResourceStore::new(source, notifier.clone(), config.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::source::{DataOrigin, SourceStrategy};
    use crate::storage::MemoryStore;
    use crate::store::FetchOutcome;
    use std::collections::HashMap;

    fn fixture_config() -> Config {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATA_SOURCE", "fixture"),
            ("STORAGE_URL", "memory"),
            ("PAGE_SIZE", "3"),
        ]);
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_fixture_mode_serves_all_collections() {
        let config = fixture_config();
        assert_eq!(config.data_source, SourceStrategy::FixtureOnly);
        let app = AdminApp::bootstrap(&config).await.unwrap();

        let outcome = app.skus.fetch().await;
        assert_eq!(
            outcome,
            FetchOutcome::Applied {
                count: 3,
                origin: DataOrigin::Fixture
            }
        );
        assert_eq!(app.skus.pagination().total, 5);
        assert!(matches!(app.products.fetch().await, FetchOutcome::Applied { .. }));
        assert_eq!(app.lookups().product_brands().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_navigation_follows_restored_session() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let config = fixture_config();

        let app = AdminApp::with_storage(&config, storage.clone()).await.unwrap();
        assert_eq!(app.navigate("/products"), Route::SignIn);

        app.session()
            .establish(Session {
                token: Some("abc".into()),
                user_name: Some("alice".into()),
                display_name: None,
            })
            .await
            .unwrap();
        assert_eq!(app.navigate("/products"), Route::Products);

        let reloaded = AdminApp::with_storage(&config, storage).await.unwrap();
        assert_eq!(reloaded.navigate("/signin"), Route::Dashboard);
        assert_eq!(reloaded.api().session().token().as_deref(), Some("abc"));
    }
}
