// =============================================================================
// MODELS MODULE
// =============================================================================
// Data structures exchanged with the catalog API and kept in the stores.
//
// NOTES:
// - Wire names are camelCase (`createdAt`, `numberInStock`)
// - Timestamps are ISO-8601 strings on the wire and in durable storage
// - Drafts are create payloads, patches carry only the fields being changed
//
// LEARNING NOTES:
// - `#[serde(rename_all = "camelCase")]` maps snake_case fields to the wire
//   names once per struct instead of once per field
// - Patch fields are `Option<T>` with `skip_serializing_if = "Option::is_none"`,
//   so an untouched field is absent from the body rather than sent as null
// - chrono's `DateTime<Utc>` serializes to RFC 3339 through its serde feature
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// ATTRIBUTES
// =============================================================================

/// Kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Text,
    Number,
    Boolean,
    Date,
    /// Enumerated values; older payloads call it `select`
    #[serde(alias = "select")]
    Dropdown,
}

impl AttributeType {
    pub const ALL: [AttributeType; 5] = [
        AttributeType::Text,
        AttributeType::Number,
        AttributeType::Boolean,
        AttributeType::Date,
        AttributeType::Dropdown,
    ];

    /// Only enumerated attributes carry a `values` list.
    pub fn is_enumerated(self) -> bool {
        matches!(self, AttributeType::Dropdown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::Text => "text",
            AttributeType::Number => "number",
            AttributeType::Boolean => "boolean",
            AttributeType::Date => "date",
            AttributeType::Dropdown => "dropdown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(AttributeType::Text),
            "number" => Some(AttributeType::Number),
            "boolean" => Some(AttributeType::Boolean),
            "date" => Some(AttributeType::Date),
            "dropdown" | "select" => Some(AttributeType::Dropdown),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Ordered enumeration; empty unless `attr_type` is enumerated
    #[serde(default, alias = "options")]
    pub values: Vec<String>,
    #[serde(default)]
    pub required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload for `POST /attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl AttributeDraft {
    /// Trims names and values, drops blank values, and clears `values`
    /// for non-enumerated types.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        if self.attr_type.is_enumerated() {
            self.values = clean_values(&self.values);
        } else {
            self.values.clear();
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        require_text("name", &self.name)?;
        if self.attr_type.is_enumerated() && clean_values(&self.values).is_empty() {
            return Err(ClientError::validation(
                "values",
                "at least one value is required for a dropdown attribute",
            ));
        }
        Ok(())
    }
}

/// Partial update for `PUT /attributes/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub attr_type: Option<AttributeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl AttributePatch {
    pub fn validate(&self) -> ClientResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let (Some(kind), Some(values)) = (self.attr_type, &self.values) {
            if kind.is_enumerated() && clean_values(values).is_empty() {
                return Err(ClientError::validation(
                    "values",
                    "at least one value is required for a dropdown attribute",
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// PRODUCTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    OutOfStock,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    /// SKUs linked to this product
    #[serde(default)]
    pub skus_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    pub price: f64,
    pub stock: u32,
    pub status: ProductStatus,
    /// Attribute name to value
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload for `POST /products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub skus_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub brand: String,
    pub price: f64,
    pub stock: u32,
    pub status: ProductStatus,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ProductDraft {
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_string();
        self.category = self.category.trim().to_string();
        self.brand = self.brand.trim().to_string();
    }

    pub fn validate(&self) -> ClientResult<()> {
        require_text("name", &self.name)?;
        require_text("sku", &self.sku)?;
        require_text("category", &self.category)?;
        validate_price(self.price)
    }
}

/// Partial update for `PUT /products/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skus_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, serde_json::Value>>,
}

impl ProductPatch {
    pub fn validate(&self) -> ClientResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

// =============================================================================
// SKUS
// =============================================================================
// The SKU endpoints carry price and stock as strings.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub id: String,
    pub model: String,
    /// Decimal as string, e.g. "49.90"
    pub price: String,
    /// Integer as string, e.g. "12"
    pub number_in_stock: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sku {
    pub fn price_value(&self) -> Option<f64> {
        self.price.trim().parse().ok()
    }

    pub fn stock_value(&self) -> Option<i64> {
        self.number_in_stock.trim().parse().ok()
    }
}

/// Create payload for `POST /skus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuDraft {
    pub model: String,
    pub price: String,
    pub number_in_stock: String,
}

impl SkuDraft {
    pub fn normalize(&mut self) {
        self.model = self.model.trim().to_string();
        self.price = self.price.trim().to_string();
        self.number_in_stock = self.number_in_stock.trim().to_string();
    }

    pub fn validate(&self) -> ClientResult<()> {
        require_text("model", &self.model)?;
        validate_price_text(&self.price)?;
        validate_stock_text(&self.number_in_stock)
    }
}

/// Partial update for `PATCH /skus/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_in_stock: Option<String>,
}

impl SkuPatch {
    pub fn validate(&self) -> ClientResult<()> {
        if let Some(model) = &self.model {
            require_text("model", model)?;
        }
        if let Some(price) = &self.price {
            validate_price_text(price)?;
        }
        if let Some(stock) = &self.number_in_stock {
            validate_stock_text(stock)?;
        }
        Ok(())
    }
}

// =============================================================================
// LIST ENVELOPE
// =============================================================================
// Shared by all three collections, hence generic over the row type.
//
// LEARNING NOTE:
// Deriving Serialize/Deserialize on a generic struct adds the matching bound
// on `T` for us: `ListEnvelope<Sku>` decodes as long as `Sku` does.
// -----------------------------------------------------------------------------
/// Canonical response of every list endpoint.
///
/// # Example JSON
/// ```json
/// { "data": [...], "total": 42, "page": 1, "limit": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

// =============================================================================
// AUTH PAYLOADS
// =============================================================================

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, alias = "username")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserProfile {
    /// "First Last", or whichever part is present.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Body of `POST /users/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub password: String,
}

/// Sign-up form as typed by the user, before validation.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub password: String,
    pub confirm_password: String,
}

pub const MIN_USERNAME_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 6;

impl RegistrationForm {
    /// Checks every field and produces the request body.
    pub fn into_request(self) -> ClientResult<RegisterRequest> {
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)?;
        require_text("userName", &self.user_name)?;
        if self.user_name.trim().chars().count() < MIN_USERNAME_LEN {
            return Err(ClientError::validation(
                "userName",
                format!("must be at least {MIN_USERNAME_LEN} characters"),
            ));
        }
        require_text("password", &self.password)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::validation(
                "confirmPassword",
                "passwords do not match",
            ));
        }
        Ok(RegisterRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            user_name: self.user_name.trim().to_string(),
            password: self.password,
        })
    }
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================
/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

fn require_text(field: &'static str, value: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(field, "is required"));
    }
    Ok(())
}

fn validate_price(price: f64) -> ClientResult<()> {
    if !price.is_finite() {
        return Err(ClientError::validation("price", "must be a number"));
    }
    if price < 0.0 {
        return Err(ClientError::validation("price", "must not be negative"));
    }
    Ok(())
}

fn validate_price_text(raw: &str) -> ClientResult<()> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ClientError::validation("price", "must be a decimal number"))?;
    validate_price(price)
}

fn validate_stock_text(raw: &str) -> ClientResult<()> {
    raw.trim()
        .parse::<u64>()
        .map(|_| ())
        .map_err(|_| ClientError::validation("numberInStock", "must be a whole number of zero or more"))
}

fn clean_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
