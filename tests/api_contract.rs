// =============================================================================
// API CONTRACT TESTS
// =============================================================================
// Runs the client against an in-process axum backend bound to 127.0.0.1:0.
// The backend mimics the catalog API closely enough to exercise the bearer
// header, both list shapes, error bodies and the 401 expiry path.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use catalog_admin::api::ApiClient;
use catalog_admin::notify::{drain, NotificationLevel, Notifier};
use catalog_admin::resource::{Attributes, Skus};
use catalog_admin::source::{DataSource, RemoteSource};
use catalog_admin::storage::{KeyValueStore, MemoryStore};
use catalog_admin::{
    AuthSession, AuthState, ClientError, DataOrigin, FetchOutcome, RemoteResourceStore,
    SessionHandle,
};
use catalog_admin::models::{Attribute, Sku, SkuDraft};

const TOKEN: &str = "tok-1";
const STAMP: &str = "2024-01-15T09:00:00Z";
const SKU_SNAPSHOT_KEY: &str = "skus-storage";

fn sku_json(id: &str, model: &str) -> Value {
    json!({ "id": id, "model": model, "price": "19.90",
            "numberInStock": "3", "createdAt": STAMP, "updatedAt": STAMP })
}

// -----------------------------------------------------------------------------
// FAKE BACKEND
// -----------------------------------------------------------------------------
#[derive(Default)]
struct Backend {
    skus: Vec<Value>,
    attribute_queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Backend>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Token expired" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["userName"] == "admin" && body["password"] == "secret" {
        Json(json!({
            "access_token": TOKEN,
            "user": { "userName": "admin", "firstName": "Ada", "lastName": "Admin" }
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" }))).into_response()
    }
}

async fn list_attributes(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let page = params.get("page").and_then(|p| p.parse::<u32>().ok()).unwrap_or(1);
    let limit = params.get("limit").and_then(|p| p.parse::<u32>().ok()).unwrap_or(10);
    state.lock().unwrap().attribute_queries.push(params);
    Json(json!({
        "data": [{
            "id": "attr-9",
            "name": "Color",
            "type": "select",
            "options": ["Red", "Blue"],
            "required": true,
            "createdAt": STAMP,
            "updatedAt": STAMP
        }],
        "total": 11,
        "page": page,
        "limit": limit
    }))
    .into_response()
}

async fn list_skus(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(Value::Array(state.lock().unwrap().skus.clone())).into_response()
}

async fn create_sku(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut backend = state.lock().unwrap();
    let sku = json!({
        "id": format!("sku-{}", backend.skus.len() + 1),
        "model": body["model"],
        "price": body["price"],
        "numberInStock": body["numberInStock"],
        "createdAt": STAMP,
        "updatedAt": STAMP
    });
    backend.skus.push(sku.clone());
    (StatusCode::CREATED, Json(sku)).into_response()
}

async fn brands_without_message() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
}

async fn categories_behind_proxy() -> Response {
    (StatusCode::BAD_GATEWAY, "<html>502 Bad Gateway</html>").into_response()
}

async fn spawn_backend() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(Backend::default()));
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/attributes", get(list_attributes))
        .route("/skus", get(list_skus).post(create_sku))
        .route("/products/brands", get(brands_without_message))
        .route("/products/categories", get(categories_behind_proxy))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

struct Harness {
    storage: Arc<dyn KeyValueStore>,
    notifier: Notifier,
    api: ApiClient,
    auth: AuthSession,
    backend: Shared,
}

async fn harness() -> Harness {
    let (base_url, backend) = spawn_backend().await;
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let notifier = Notifier::new();
    let session = SessionHandle::restore(storage.clone()).await.unwrap();
    let api = ApiClient::new(&base_url, None, session.clone(), notifier.clone()).unwrap();
    let auth = AuthSession::new(api.clone(), session);
    Harness {
        storage,
        notifier,
        api,
        auth,
        backend,
    }
}

// -----------------------------------------------------------------------------
// AUTHENTICATION
// -----------------------------------------------------------------------------
#[tokio::test]
async fn test_login_persists_session_and_sends_bearer() {
    let h = harness().await;

    let session = h.auth.login("admin", "secret").await.unwrap();
    assert_eq!(session.token.as_deref(), Some(TOKEN));
    assert_eq!(session.display_name.as_deref(), Some("Ada Admin"));
    assert_eq!(h.auth.state(), AuthState::Authenticated);

    let restored = SessionHandle::restore(h.storage.clone()).await.unwrap();
    assert_eq!(restored.current(), session);

    let source = RemoteSource::<Attributes>::new(h.api.clone());
    let page = source
        .list(&catalog_admin::source::ListQuery {
            filters: Default::default(),
            page: 2,
            limit: 5,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 11);
    assert_eq!(page.origin, DataOrigin::Remote);
    let attr: &Attribute = &page.items[0];
    assert_eq!(attr.values, vec!["Red", "Blue"]);

    let seen = h.backend.lock().unwrap().attribute_queries.clone();
    assert_eq!(seen[0].get("page").map(String::as_str), Some("2"));
    assert_eq!(seen[0].get("limit").map(String::as_str), Some("5"));
}

#[tokio::test]
async fn test_bad_credentials_stay_anonymous() {
    let h = harness().await;

    let err = h.auth.login("admin", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(h.auth.error().as_deref(), Some("Invalid credentials"));
    assert_eq!(h.auth.state(), AuthState::Anonymous);
    assert!(SessionHandle::restore(h.storage.clone()).await.unwrap().token().is_none());
}

/// Snapshot store over the remote tier, after one applied fetch of a
/// private catalog.
async fn snapshotted_skus(h: &Harness) -> RemoteResourceStore<Skus> {
    h.backend.lock().unwrap().skus = vec![sku_json("sku-1", "ALICE-PRIVATE")];
    let store = RemoteResourceStore::<Skus>::with_snapshot(
        Arc::new(RemoteSource::<Skus>::new(h.api.clone())),
        h.notifier.clone(),
        10,
        h.storage.clone(),
    )
    .await;
    assert!(matches!(store.fetch().await, FetchOutcome::Applied { count: 1, .. }));
    assert!(h.storage.get(SKU_SNAPSHOT_KEY).await.unwrap().is_some());
    store
}

async fn assert_nothing_restored(h: &Harness) {
    assert_eq!(h.storage.get(SKU_SNAPSHOT_KEY).await.unwrap(), None);
    let reopened = RemoteResourceStore::<Skus>::with_snapshot(
        Arc::new(RemoteSource::<Skus>::new(h.api.clone())),
        Notifier::new(),
        10,
        h.storage.clone(),
    )
    .await;
    assert!(reopened.items().is_empty());
    assert_eq!(reopened.origin(), None);
}

#[tokio::test]
async fn test_rejected_token_expires_session_and_snapshots() {
    let h = harness().await;
    h.auth.login("admin", "secret").await.unwrap();
    let store = snapshotted_skus(&h).await;

    h.auth
        .handle()
        .establish(catalog_admin::Session {
            token: Some("stale".into()),
            user_name: Some("admin".into()),
            display_name: None,
        })
        .await
        .unwrap();

    assert_eq!(store.fetch().await, FetchOutcome::Failed);
    assert_eq!(store.error().as_deref(), Some("Token expired"));
    assert!(store.items().is_empty());

    assert_eq!(h.auth.state(), AuthState::Anonymous);
    assert!(SessionHandle::restore(h.storage.clone()).await.unwrap().token().is_none());
    assert_nothing_restored(&h).await;
}

#[tokio::test]
async fn test_logout_forgets_persisted_session_and_snapshots() {
    let h = harness().await;
    h.auth.login("admin", "secret").await.unwrap();
    snapshotted_skus(&h).await;

    h.auth.logout().await.unwrap();
    assert_eq!(h.auth.state(), AuthState::Anonymous);
    assert_eq!(
        SessionHandle::restore(h.storage.clone())
            .await
            .unwrap()
            .current(),
        catalog_admin::Session::default()
    );
    assert_nothing_restored(&h).await;
}

// -----------------------------------------------------------------------------
// COLLECTIONS
// -----------------------------------------------------------------------------
#[tokio::test]
async fn test_bare_array_list_is_normalized() {
    let h = harness().await;
    h.auth.login("admin", "secret").await.unwrap();
    h.backend.lock().unwrap().skus = vec![
        json!({ "id": "sku-1", "model": "WH-1000", "price": "199.00",
                "numberInStock": "25", "createdAt": STAMP, "updatedAt": STAMP }),
        json!({ "id": "sku-2", "model": "MUG-RED", "price": "9.50",
                "numberInStock": "0", "createdAt": STAMP, "updatedAt": STAMP }),
    ];

    let envelope = h.api.list::<Sku>("/skus", &[], 1, 10).await.unwrap();
    assert_eq!(envelope.total, 2);
    assert_eq!(envelope.page, 1);
    assert_eq!(envelope.limit, 10);
    assert_eq!(envelope.data[1].stock_value(), Some(0));
}

#[tokio::test]
async fn test_create_refetches_from_server() {
    let h = harness().await;
    h.auth.login("admin", "secret").await.unwrap();
    let mut notes = h.notifier.observer();

    let store = RemoteResourceStore::<Skus>::new(
        Arc::new(RemoteSource::<Skus>::new(h.api.clone())),
        h.notifier.clone(),
        10,
    );
    assert_eq!(
        store.fetch().await,
        FetchOutcome::Applied {
            count: 0,
            origin: DataOrigin::Remote
        }
    );

    let created = store
        .create(SkuDraft {
            model: "  YM-CORK ".into(),
            price: "24.00".into(),
            number_in_stock: "60".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.model, "YM-CORK");

    let items = store.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, created.id);
    assert_eq!(store.pagination().total, 1);

    let messages: Vec<_> = drain(&mut notes)
        .into_iter()
        .filter(|n| n.level == NotificationLevel::Success)
        .map(|n| n.message)
        .collect();
    assert!(messages.contains(&"SKU created successfully".to_string()));
}

// -----------------------------------------------------------------------------
// ERROR BODIES
// -----------------------------------------------------------------------------
#[tokio::test]
async fn test_error_body_without_message_uses_status() {
    let h = harness().await;
    let err = h.api.product_brands().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500");
    assert_eq!(err.status(), Some(500));
    assert!(err.allows_fallback());
}

#[tokio::test]
async fn test_unparseable_error_body_is_network_error() {
    let h = harness().await;
    let err = h.api.product_categories().await.unwrap_err();
    assert_eq!(err.to_string(), "Network error");
    assert_eq!(err.status(), Some(502));
}
