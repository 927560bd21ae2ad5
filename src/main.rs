// =============================================================================
// CATALOG ADMIN - Main Entry Point
// =============================================================================
// Boots the admin shell without a UI:
//
//   catalog-admin [PATH]
//
// restores the session, optionally logs in with ADMIN_USERNAME /
// ADMIN_PASSWORD, resolves PATH (default "/") through the route table,
// mounts the matching page and logs what it would show.
// =============================================================================

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_admin::metrics::setup_metrics;
use catalog_admin::notify::{drain, NotificationLevel};
use catalog_admin::pages::DashboardPage;
use catalog_admin::resource::Resource;
use catalog_admin::router::Route;
use catalog_admin::{AdminApp, Config, FetchOutcome, RemoteResourceStore};

// LEARNING NOTE:
// `anyhow::Result` lets main return any error type; `.context(...)` wraps a
// ClientError with a message saying which step failed.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -------------------------------------------------------------------------
    // STEP 1: Load environment variables
    // -------------------------------------------------------------------------
    dotenvy::dotenv().ok();

    // -------------------------------------------------------------------------
    // STEP 2: Initialize logging/tracing
    // -------------------------------------------------------------------------
    // RUST_LOG controls log levels, e.g. RUST_LOG=info,catalog_admin=debug
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catalog_admin=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting catalog admin...");

    // -------------------------------------------------------------------------
    // STEP 3: Load configuration
    // -------------------------------------------------------------------------
    let config = Config::from_env()?;
    info!(
        api = %config.api_base_url,
        storage = %config.storage_url,
        data_source = %config.data_source,
        "Configuration loaded"
    );

    // -------------------------------------------------------------------------
    // STEP 4: Set up Prometheus metrics
    // -------------------------------------------------------------------------
    let metrics_handle = setup_metrics()?;

    // -------------------------------------------------------------------------
    // STEP 5: Build the application
    // -------------------------------------------------------------------------
    let app = AdminApp::bootstrap(&config)
        .await
        .context("Failed to bootstrap the admin app")?;
    let mut notifications = app.notifier().observer();

    // -------------------------------------------------------------------------
    // STEP 6: Optional credential login
    // -------------------------------------------------------------------------
    if let (Ok(user), Ok(password)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        if !app.auth().is_logged_in() {
            if let Err(err) = app.auth().login(&user, &password).await {
                warn!(user = %user, error = %err, "Login at boot failed");
            }
        }
    }

    // -------------------------------------------------------------------------
    // STEP 7: Route and mount
    // -------------------------------------------------------------------------
    let requested = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    let route = app.navigate(&requested);
    info!(requested = %requested, mounted = %route, "Route resolved");

    match route {
        Route::SignIn | Route::SignUp => {
            info!(
                error = app.auth().error().as_deref().unwrap_or(""),
                "Not signed in; set ADMIN_USERNAME and ADMIN_PASSWORD to log in"
            );
        }
        Route::Dashboard => {
            info!(greeting = %DashboardPage::greeting(&app.session().current()), "Dashboard");
        }
        Route::Attributes => {
            let page = app.attributes_page();
            report(page.store(), page.mount().await);
            if let Ok(types) = app.lookups().attribute_types().await {
                info!(types = ?types, "Attribute types");
            }
        }
        Route::Products => {
            let page = app.products_page();
            report(page.store(), page.mount().await);
            if let Ok(categories) = app.lookups().product_categories().await {
                info!(categories = ?categories, "Product categories");
            }
            if let Ok(brands) = app.lookups().product_brands().await {
                info!(brands = ?brands, "Product brands");
            }
        }
        Route::Skus => {
            let page = app.skus_page();
            report(page.store(), page.mount().await);
        }
    }

    // -------------------------------------------------------------------------
    // STEP 8: Flush notifications and metrics
    // -------------------------------------------------------------------------
    for note in drain(&mut notifications) {
        match note.level {
            NotificationLevel::Success => info!(message = %note.message, "toast"),
            NotificationLevel::Warning | NotificationLevel::Error => {
                warn!(level = ?note.level, message = %note.message, "toast")
            }
        }
    }
    info!(metrics = %metrics_handle.render(), "Shutting down");

    Ok(())
}

fn report<R: Resource>(store: &RemoteResourceStore<R>, outcome: FetchOutcome) {
    let snapshot = store.snapshot();
    info!(
        resource = store.resource(),
        outcome = ?outcome,
        shown = snapshot.items.len(),
        total = snapshot.pagination.total,
        page = snapshot.pagination.page,
        pages = snapshot.pagination.page_count(),
        error = snapshot.error.as_deref().unwrap_or(""),
        "Page mounted"
    );
}
