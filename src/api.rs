// =============================================================================
// API CLIENT MODULE
// =============================================================================
// Thin typed wrapper over reqwest for the catalog REST API.
//
// CONTRACT:
// - Every request carries `Authorization: Bearer <token>` while a token is held
// - Non-2xx bodies are read as `{ "message": ... }`; an unreadable body
//   becomes "Network error", a body without message becomes "HTTP <status>"
// - A 401 while holding a token expires the session
// - List endpoints are decoded as the envelope `{ data, total, page, limit }`.
//   Some deployments answer with a bare JSON array; it is normalized here,
//   once, into the same envelope (total = length, page = requested page).
// =============================================================================

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ClientError, ClientResult, FALLBACK_ERROR_MESSAGE};
use crate::metrics;
use crate::models::{ApiErrorBody, ListEnvelope, LoginRequest, LoginResponse, RegisterRequest};
use crate::network::NetworkMonitor;
use crate::notify::Notifier;
use crate::session::SessionHandle;

/// Body of a list response, in either observed shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Envelope(ListEnvelope<T>),
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    fn into_envelope(self, page: u32, limit: u32) -> ListEnvelope<T> {
        match self {
            ListBody::Envelope(envelope) => envelope,
            ListBody::Bare(data) => ListEnvelope {
                total: data.len() as u64,
                page,
                limit,
                data,
            },
        }
    }
}

// -----------------------------------------------------------------------------
// API CLIENT
// -----------------------------------------------------------------------------
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    session: SessionHandle,
    network: NetworkMonitor,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        session: SessionHandle,
        notifier: Notifier,
    ) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            session,
            network: NetworkMonitor::new(notifier),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    // -------------------------------------------------------------------------
    // GENERIC REQUESTS
    // -------------------------------------------------------------------------

    /// Sends one request and decodes the JSON response.
    ///
    /// `route` is the path template used for metrics (`/attributes/:id`).
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        route: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> ClientResult<T> {
        let start = Instant::now();
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                self.network.record_transport_failure();
                metrics::record_api_request(method.as_str(), route, 0, start.elapsed().as_secs_f64());
                tracing::warn!(method = %method, url = %url, error = %err, "API request failed");
                return Err(err.into());
            }
        };
        self.network.record_response();

        let status = response.status();
        let bytes = response.bytes().await?;
        let duration = start.elapsed().as_secs_f64();
        metrics::record_api_request(method.as_str(), route, status.as_u16(), duration);
        tracing::debug!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            duration_ms = duration * 1000.0,
            "API request completed"
        );

        if !status.is_success() {
            return Err(self.error_from(status, &bytes).await);
        }
        decode_body(&bytes)
    }

    async fn error_from(&self, status: StatusCode, body: &[u8]) -> ClientError {
        let message = match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(ApiErrorBody {
                message: Some(message),
            }) if !message.trim().is_empty() => message,
            Ok(_) => format!("HTTP {}", status.as_u16()),
            Err(_) => FALLBACK_ERROR_MESSAGE.to_string(),
        };

        if status == StatusCode::UNAUTHORIZED {
            if self.session.is_logged_in() {
                self.session.expire().await;
            }
            return ClientError::Unauthorized(message);
        }
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, route: &str) -> ClientResult<T> {
        self.send(Method::GET, path, route, &[], None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        route: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, route, &[], Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        route: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, route, &[], Some(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        route: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PATCH, path, route, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str, route: &str) -> ClientResult<()> {
        let _: serde_json::Value = self.send(Method::DELETE, path, route, &[], None).await?;
        Ok(())
    }

    /// `GET <path>?<filters>&page=&limit=` in the canonical envelope.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        filters: &[(&'static str, String)],
        page: u32,
        limit: u32,
    ) -> ClientResult<ListEnvelope<T>> {
        let mut query: Vec<(&str, String)> = filters.to_vec();
        query.push(("page", page.to_string()));
        query.push(("limit", limit.to_string()));
        let body: ListBody<T> = self.send(Method::GET, path, path, &query, None).await?;
        Ok(body.into_envelope(page, limit))
    }

    // -------------------------------------------------------------------------
    // AUTH ENDPOINTS
    // -------------------------------------------------------------------------

    /// POST /auth/login
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        self.post("/auth/login", "/auth/login", request).await
    }

    /// POST /users/register (201 on success)
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<()> {
        let _: serde_json::Value = self.post("/users/register", "/users/register", request).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // LOOKUP ENDPOINTS
    // -------------------------------------------------------------------------

    /// GET /attributes/types
    pub async fn attribute_types(&self) -> ClientResult<Vec<String>> {
        self.get("/attributes/types", "/attributes/types").await
    }

    /// GET /products/categories
    pub async fn product_categories(&self) -> ClientResult<Vec<String>> {
        self.get("/products/categories", "/products/categories").await
    }

    /// GET /products/brands
    pub async fn product_brands(&self) -> ClientResult<Vec<String>> {
        self.get("/products/brands", "/products/brands").await
    }
}

/// An empty body decodes as JSON `null`, so `()` and `Value` both work for 204s.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> ClientResult<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(bytes)?)
}
