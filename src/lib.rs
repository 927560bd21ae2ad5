// =============================================================================
// CATALOG ADMIN - Library Root
// =============================================================================
// Client-side core of the catalog admin panel.
//
// WHAT THIS CRATE DOES:
// - Mirrors the attributes, products and SKUs collections in resource stores
// - Debounces filter edits into store commits
// - Builds name/value field sets with a growable key/value form
// - Keeps a persisted, injectable authentication session
// - Falls back to fixture data when the API is unreachable (configurable)
// =============================================================================

// -----------------------------------------------------------------------------
// MODULE DECLARATIONS
// -----------------------------------------------------------------------------
pub mod api;        // Typed REST client (api.rs)
pub mod app;        // Composition root (app.rs)
pub mod config;     // Configuration loading (config.rs)
pub mod debounce;   // Filter debouncer (debounce.rs)
pub mod error;      // Error types (error.rs)
pub mod filters;    // Filter criteria per collection (filters.rs)
pub mod fixtures;   // Static offline catalog (fixtures.rs)
pub mod form;       // Dynamic key/value form (form.rs)
pub mod metrics;    // Prometheus metrics (metrics.rs)
pub mod models;     // Data structures (models.rs)
pub mod network;    // Online/offline tracking (network.rs)
pub mod notify;     // Transient notifications (notify.rs)
pub mod pages;      // Page controllers (pages.rs)
pub mod pagination; // Page cursor (pagination.rs)
pub mod resource;   // Resource descriptors (resource.rs)
pub mod router;     // Route table (router.rs)
pub mod session;    // Authentication session (session.rs)
pub mod source;     // Remote/fixture data tiers (source.rs)
pub mod storage;    // Durable key-value storage (storage.rs)
pub mod store;      // Resource stores (store.rs)

// -----------------------------------------------------------------------------
// RE-EXPORTS
// -----------------------------------------------------------------------------
pub use app::AdminApp;
pub use config::Config;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use form::{DynamicKeyValueForm, FormField, FormRow};
pub use session::{AuthSession, AuthState, Session, SessionHandle};
pub use source::{DataOrigin, SourceStrategy};
pub use store::{FetchOutcome, RemoteResourceStore};
