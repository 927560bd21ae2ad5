// =============================================================================
// FILTERS MODULE
// =============================================================================
// Filter criteria for each resource collection.
//
// A criteria value does two jobs:
// - renders itself as query-string pairs for the list endpoint
// - matches entities locally (fixture tier, and the page-level view)
// Empty strings and `None` mean "no constraint".
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::models::{Attribute, AttributeType, Product, ProductStatus, Sku};

/// Criteria that can narrow a collection of `T`.
pub trait EntityFilter<T> {
    /// True when `entity` satisfies every active predicate.
    fn matches(&self, entity: &T) -> bool;

    /// Query-string pairs sent to the list endpoint; inactive predicates are omitted.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;

    /// True when no predicate is active.
    fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn push_text(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        pairs.push((key, value.to_string()));
    }
}

// =============================================================================
// ATTRIBUTE FILTERS
// =============================================================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilters {
    pub search: String,
    #[serde(rename = "type")]
    pub attr_type: Option<AttributeType>,
}

impl EntityFilter<Attribute> for AttributeFilters {
    fn matches(&self, attr: &Attribute) -> bool {
        if let Some(kind) = self.attr_type {
            if attr.attr_type != kind {
                return false;
            }
        }
        let search = self.search.trim().to_lowercase();
        search.is_empty()
            || contains_ci(&attr.name, &search)
            || attr.values.iter().any(|v| contains_ci(v, &search))
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "search", &self.search);
        if let Some(kind) = self.attr_type {
            pairs.push(("type", kind.as_str().to_string()));
        }
        pairs
    }
}

// =============================================================================
// PRODUCT FILTERS
// =============================================================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
    pub search: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub status: Option<ProductStatus>,
}

impl EntityFilter<Product> for ProductFilters {
    fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(brand) = self.brand.as_deref().filter(|b| !b.is_empty()) {
            if !product.brand.eq_ignore_ascii_case(brand) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if product.status != status {
                return false;
            }
        }
        let search = self.search.trim().to_lowercase();
        search.is_empty()
            || contains_ci(&product.name, &search)
            || contains_ci(&product.id, &search)
            || contains_ci(&product.sku, &search)
            || product.skus_ids.iter().any(|id| contains_ci(id, &search))
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "search", &self.search);
        if let Some(category) = &self.category {
            push_text(&mut pairs, "category", category);
        }
        if let Some(brand) = &self.brand {
            push_text(&mut pairs, "brand", brand);
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}

// =============================================================================
// SKU FILTERS
// =============================================================================
// The SKU list endpoint takes no filter parameters; the buckets below are
// applied locally to whatever page the server returned.

/// Price buckets offered by the SKU filter form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "0-50")]
    UpTo50,
    #[serde(rename = "50-100")]
    From50To100,
    #[serde(rename = "100-500")]
    From100To500,
    #[serde(rename = "500+")]
    Over500,
}

impl PriceRange {
    /// Lower bound is inclusive only for the first bucket.
    pub fn contains(self, price: f64) -> bool {
        match self {
            PriceRange::UpTo50 => (0.0..=50.0).contains(&price),
            PriceRange::From50To100 => price > 50.0 && price <= 100.0,
            PriceRange::From100To500 => price > 100.0 && price <= 500.0,
            PriceRange::Over500 => price > 500.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0-50" => Some(PriceRange::UpTo50),
            "50-100" => Some(PriceRange::From50To100),
            "100-500" => Some(PriceRange::From100To500),
            "500+" => Some(PriceRange::Over500),
            _ => None,
        }
    }
}

/// Stock level buckets; "low" means strictly between 0 and 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockLevel {
    InStock,
    LowStock,
    OutOfStock,
}

pub const LOW_STOCK_THRESHOLD: i64 = 10;

impl StockLevel {
    pub fn contains(self, stock: i64) -> bool {
        match self {
            StockLevel::InStock => stock > 0,
            StockLevel::LowStock => stock > 0 && stock < LOW_STOCK_THRESHOLD,
            StockLevel::OutOfStock => stock == 0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "in-stock" => Some(StockLevel::InStock),
            "low-stock" => Some(StockLevel::LowStock),
            "out-of-stock" => Some(StockLevel::OutOfStock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuFilters {
    pub search: String,
    pub price_range: Option<PriceRange>,
    pub stock_level: Option<StockLevel>,
}

impl EntityFilter<Sku> for SkuFilters {
    fn matches(&self, sku: &Sku) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() && !contains_ci(&sku.model, &search) && !contains_ci(&sku.id, &search)
        {
            return false;
        }
        if let Some(range) = self.price_range {
            match sku.price_value() {
                Some(price) if range.contains(price) => {}
                _ => return false,
            }
        }
        if let Some(level) = self.stock_level {
            match sku.stock_value() {
                Some(stock) if level.contains(stock) => {}
                _ => return false,
            }
        }
        true
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.price_range.is_none() && self.stock_level.is_none()
    }
}
