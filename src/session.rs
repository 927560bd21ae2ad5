// =============================================================================
// SESSION MODULE
// =============================================================================
// Authenticated identity and its lifecycle.
//
// STATE MACHINE:
//   Anonymous --login ok--> Authenticated --logout / 401--> Anonymous
//
// The session lives in a `SessionHandle` that is handed to the API client
// (bearer header, 401 expiry) and to the router guard. Every change is
// written through to durable storage so a restart restores it.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{LoginRequest, RegistrationForm};
use crate::resource::{Attributes, Products, Resource, Skus};
use crate::storage::{snapshot_key, KeyValueStore};

// -----------------------------------------------------------------------------
// STORAGE KEYS
// -----------------------------------------------------------------------------
pub const TOKEN_KEY: &str = "token";
pub const USER_NAME_KEY: &str = "userName";
pub const DISPLAY_NAME_KEY: &str = "displayName";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque bearer credential
    pub token: Option<String>,
    pub user_name: Option<String>,
    pub display_name: Option<String>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn state(&self) -> AuthState {
        if self.is_logged_in() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    /// Display name, falling back to the username.
    pub fn greeting_name(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.user_name.as_deref())
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Collections whose snapshots hold the signed-in user's data.
pub const SNAPSHOT_COLLECTIONS: [&str; 3] = [
    Attributes::COLLECTION,
    Products::COLLECTION,
    Skus::COLLECTION,
];

/// Reads the session fields. A missing token means an anonymous session.
pub async fn load_session(storage: &dyn KeyValueStore) -> ClientResult<Session> {
    let token = storage.get(TOKEN_KEY).await?.filter(|t| !t.is_empty());
    if token.is_none() {
        return Ok(Session::default());
    }
    Ok(Session {
        token,
        user_name: storage.get(USER_NAME_KEY).await?,
        display_name: storage.get(DISPLAY_NAME_KEY).await?,
    })
}

/// Writes every session field; absent fields are removed.
pub async fn save_session(storage: &dyn KeyValueStore, session: &Session) -> ClientResult<()> {
    for (key, value) in [
        (TOKEN_KEY, &session.token),
        (USER_NAME_KEY, &session.user_name),
        (DISPLAY_NAME_KEY, &session.display_name),
    ] {
        match value {
            Some(v) => storage.set(key, v).await?,
            None => storage.remove(key).await?,
        }
    }
    Ok(())
}

/// Removes the session fields and every collection snapshot.
pub async fn clear_session(storage: &dyn KeyValueStore) -> ClientResult<()> {
    save_session(storage, &Session::default()).await?;
    for collection in SNAPSHOT_COLLECTIONS {
        storage.remove(&snapshot_key(collection)).await?;
    }
    Ok(())
}

// =============================================================================
// SESSION HANDLE
// =============================================================================
/// Shared, persisted session. Clones observe the same state.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<Session>>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionHandle {
    /// Rebuilds the session from durable storage at boot.
    pub async fn restore(storage: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        let session = load_session(storage.as_ref()).await?;
        tracing::info!(logged_in = session.is_logged_in(), "Session restored");
        Ok(Self {
            state: Arc::new(RwLock::new(session)),
            storage,
        })
    }

    pub fn current(&self) -> Session {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current().token
    }

    pub fn is_logged_in(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_logged_in()
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).state()
    }

    /// Persists `session` and makes it current.
    pub async fn establish(&self, session: Session) -> ClientResult<()> {
        save_session(self.storage.as_ref(), &session).await?;
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = session;
        Ok(())
    }

    /// Forgets the session in memory, and in storage along with the
    /// collection snapshots taken under it.
    pub async fn clear(&self) -> ClientResult<()> {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
        clear_session(self.storage.as_ref()).await
    }

    /// Called when the API rejects the held credential.
    pub async fn expire(&self) {
        tracing::warn!("Credential rejected by API, session expired");
        if let Err(err) = self.clear().await {
            tracing::error!(error = %err, "Failed to clear expired session from storage");
        }
    }
}

// =============================================================================
// AUTH SESSION
// =============================================================================
/// Login, registration and logout against the API.
#[derive(Clone)]
pub struct AuthSession {
    api: ApiClient,
    handle: SessionHandle,
    error: Arc<Mutex<Option<String>>>,
}

impl AuthSession {
    pub fn new(api: ApiClient, handle: SessionHandle) -> Self {
        Self {
            api,
            handle,
            error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn state(&self) -> AuthState {
        self.handle.auth_state()
    }

    pub fn is_logged_in(&self) -> bool {
        self.handle.is_logged_in()
    }

    /// Last login/registration failure, for inline display.
    pub fn error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    fn set_error(&self, message: Option<String>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    /// Exchanges credentials for a bearer token and persists the session.
    pub async fn login(&self, identifier: &str, secret: &str) -> ClientResult<Session> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ClientError::validation("userName", "is required"));
        }
        if secret.is_empty() {
            return Err(ClientError::validation("password", "is required"));
        }

        let request = LoginRequest {
            user_name: identifier.to_string(),
            password: secret.to_string(),
        };
        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(user = %identifier, error = %err, "Login failed");
                self.set_error(Some(err.to_string()));
                return Err(err);
            }
        };

        let profile = response.user.unwrap_or_default();
        let session = Session {
            token: Some(response.access_token),
            user_name: profile
                .user_name
                .clone()
                .or_else(|| Some(identifier.to_string())),
            display_name: profile.display_name(),
        };
        if !session.is_logged_in() {
            let err = ClientError::Unauthorized("Login response carried no token".to_string());
            self.set_error(Some(err.to_string()));
            return Err(err);
        }

        if let Err(err) = self.handle.establish(session.clone()).await {
            self.set_error(Some(err.to_string()));
            return Err(err);
        }
        self.set_error(None);
        tracing::info!(user = %identifier, "Logged in");
        Ok(session)
    }

    /// Creates an account. Does not log in; call `login` afterwards.
    pub async fn register(&self, form: RegistrationForm) -> ClientResult<()> {
        let request = form.into_request()?;
        match self.api.register(&request).await {
            Ok(()) => {
                self.set_error(None);
                tracing::info!(user = %request.user_name, "Registered");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(user = %request.user_name, error = %err, "Registration failed");
                self.set_error(Some(err.to_string()));
                Err(err)
            }
        }
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.handle.clear().await?;
        self.set_error(None);
        tracing::info!("Logged out");
        Ok(())
    }
}
