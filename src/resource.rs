// =============================================================================
// RESOURCE MODULE
// =============================================================================
// Binds one entity type to everything a store needs to manage it: the REST
// path, the create/update payloads, the filter criteria and the fixture rows
// used by the offline tier.
//
// One implementation per collection:
// - Attributes  /attributes  (PUT updates)
// - Products    /products    (PUT updates)
// - Skus        /skus        (PATCH updates)
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::error::ClientResult;
use crate::filters::{AttributeFilters, EntityFilter, ProductFilters, SkuFilters};
use crate::fixtures;
use crate::models::{
    Attribute, AttributeDraft, AttributePatch, Product, ProductDraft, ProductPatch, Sku, SkuDraft,
    SkuPatch,
};

/// HTTP method used for updates on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateVerb {
    Put,
    Patch,
}

// -----------------------------------------------------------------------------
// RESOURCE TRAIT
// -----------------------------------------------------------------------------
// LEARNING NOTE:
// Associated types (`Entity`, `Draft`, ...) tie the payload types to the
// collection, so `RemoteResourceStore<Skus>::create` only accepts a SkuDraft.
// The marker structs below carry no data; they exist to be type parameters.
pub trait Resource: Send + Sync + 'static {
    type Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Draft: Clone + Debug + Serialize + Send + Sync + 'static;
    type Patch: Clone + Debug + Serialize + Send + Sync + 'static;
    type Filters: EntityFilter<Self::Entity>
        + Default
        + Clone
        + PartialEq
        + Debug
        + Send
        + Sync
        + 'static;

    /// Singular label used in notifications ("Attribute created successfully")
    const LABEL: &'static str;
    /// Collection name; metrics label and snapshot key prefix
    const COLLECTION: &'static str;
    /// List endpoint, relative to the API base URL
    const PATH: &'static str;
    /// Route template for single-entity endpoints, used as a metrics label
    const ITEM_ROUTE: &'static str;
    const UPDATE_VERB: UpdateVerb;

    fn id(entity: &Self::Entity) -> &str;

    fn normalize_draft(draft: &mut Self::Draft);
    fn validate_draft(draft: &Self::Draft) -> ClientResult<()>;
    fn validate_patch(patch: &Self::Patch) -> ClientResult<()>;

    /// Builds the entity a server would return for `draft`.
    fn materialize(id: String, draft: &Self::Draft, now: DateTime<Utc>) -> Self::Entity;

    /// Applies the fields present in `patch` and bumps `updatedAt`.
    fn apply_patch(entity: &mut Self::Entity, patch: &Self::Patch, now: DateTime<Utc>);

    /// Rows served by the fixture tier.
    fn fixtures() -> Vec<Self::Entity>;

    fn item_path(id: &str) -> String {
        format!("{}/{}", Self::PATH, id)
    }
}

// =============================================================================
// ATTRIBUTES
// =============================================================================
pub struct Attributes;

impl Resource for Attributes {
    type Entity = Attribute;
    type Draft = AttributeDraft;
    type Patch = AttributePatch;
    type Filters = AttributeFilters;

    const LABEL: &'static str = "Attribute";
    const COLLECTION: &'static str = "attributes";
    const PATH: &'static str = "/attributes";
    const ITEM_ROUTE: &'static str = "/attributes/:id";
    const UPDATE_VERB: UpdateVerb = UpdateVerb::Put;

    fn id(entity: &Attribute) -> &str {
        &entity.id
    }

    fn normalize_draft(draft: &mut AttributeDraft) {
        draft.normalize();
    }

    fn validate_draft(draft: &AttributeDraft) -> ClientResult<()> {
        draft.validate()
    }

    fn validate_patch(patch: &AttributePatch) -> ClientResult<()> {
        patch.validate()
    }

    fn materialize(id: String, draft: &AttributeDraft, now: DateTime<Utc>) -> Attribute {
        Attribute {
            id,
            name: draft.name.clone(),
            attr_type: draft.attr_type,
            values: draft.values.clone(),
            required: draft.required,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(attr: &mut Attribute, patch: &AttributePatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            attr.name = name.trim().to_string();
        }
        if let Some(kind) = patch.attr_type {
            attr.attr_type = kind;
        }
        if let Some(values) = &patch.values {
            attr.values = values.clone();
        }
        if !attr.attr_type.is_enumerated() {
            attr.values.clear();
        }
        if let Some(required) = patch.required {
            attr.required = required;
        }
        attr.updated_at = now;
    }

    fn fixtures() -> Vec<Attribute> {
        fixtures::attributes()
    }
}

// =============================================================================
// PRODUCTS
// =============================================================================
pub struct Products;

impl Resource for Products {
    type Entity = Product;
    type Draft = ProductDraft;
    type Patch = ProductPatch;
    type Filters = ProductFilters;

    const LABEL: &'static str = "Product";
    const COLLECTION: &'static str = "products";
    const PATH: &'static str = "/products";
    const ITEM_ROUTE: &'static str = "/products/:id";
    const UPDATE_VERB: UpdateVerb = UpdateVerb::Put;

    fn id(entity: &Product) -> &str {
        &entity.id
    }

    fn normalize_draft(draft: &mut ProductDraft) {
        draft.normalize();
    }

    fn validate_draft(draft: &ProductDraft) -> ClientResult<()> {
        draft.validate()
    }

    fn validate_patch(patch: &ProductPatch) -> ClientResult<()> {
        patch.validate()
    }

    fn materialize(id: String, draft: &ProductDraft, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: draft.name.clone(),
            sku: draft.sku.clone(),
            skus_ids: draft.skus_ids.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            brand: draft.brand.clone(),
            price: draft.price,
            stock: draft.stock,
            status: draft.status,
            attributes: draft.attributes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(product: &mut Product, patch: &ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(sku) = &patch.sku {
            product.sku = sku.clone();
        }
        if let Some(ids) = &patch.skus_ids {
            product.skus_ids = ids.clone();
        }
        if let Some(description) = &patch.description {
            product.description = Some(description.clone());
        }
        if let Some(category) = &patch.category {
            product.category = category.clone();
        }
        if let Some(brand) = &patch.brand {
            product.brand = brand.clone();
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(status) = patch.status {
            product.status = status;
        }
        if let Some(attributes) = &patch.attributes {
            product.attributes = attributes.clone();
        }
        product.updated_at = now;
    }

    fn fixtures() -> Vec<Product> {
        fixtures::products()
    }
}

// =============================================================================
// SKUS
// =============================================================================
pub struct Skus;

impl Resource for Skus {
    type Entity = Sku;
    type Draft = SkuDraft;
    type Patch = SkuPatch;
    type Filters = SkuFilters;

    const LABEL: &'static str = "SKU";
    const COLLECTION: &'static str = "skus";
    const PATH: &'static str = "/skus";
    const ITEM_ROUTE: &'static str = "/skus/:id";
    const UPDATE_VERB: UpdateVerb = UpdateVerb::Patch;

    fn id(entity: &Sku) -> &str {
        &entity.id
    }

    fn normalize_draft(draft: &mut SkuDraft) {
        draft.normalize();
    }

    fn validate_draft(draft: &SkuDraft) -> ClientResult<()> {
        draft.validate()
    }

    fn validate_patch(patch: &SkuPatch) -> ClientResult<()> {
        patch.validate()
    }

    fn materialize(id: String, draft: &SkuDraft, now: DateTime<Utc>) -> Sku {
        Sku {
            id,
            model: draft.model.clone(),
            price: draft.price.clone(),
            number_in_stock: draft.number_in_stock.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(sku: &mut Sku, patch: &SkuPatch, now: DateTime<Utc>) {
        if let Some(model) = &patch.model {
            sku.model = model.trim().to_string();
        }
        if let Some(price) = &patch.price {
            sku.price = price.trim().to_string();
        }
        if let Some(stock) = &patch.number_in_stock {
            sku.number_in_stock = stock.trim().to_string();
        }
        sku.updated_at = now;
    }

    fn fixtures() -> Vec<Sku> {
        fixtures::skus()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttributeType;

    #[test]
    fn test_paths() {
        assert_eq!(Attributes::item_path("a1"), "/attributes/a1");
        assert_eq!(Skus::UPDATE_VERB, UpdateVerb::Patch);
        assert_eq!(Products::UPDATE_VERB, UpdateVerb::Put);
    }

    #[test]
    fn test_patch_to_plain_type_clears_values() {
        let mut attr = Attributes::fixtures()
            .into_iter()
            .find(|a| a.attr_type.is_enumerated())
            .unwrap();
        assert!(!attr.values.is_empty());
        let before = attr.updated_at;

        let now = before + chrono::Duration::minutes(5);
        let patch = AttributePatch {
            attr_type: Some(AttributeType::Text),
            ..Default::default()
        };
        Attributes::apply_patch(&mut attr, &patch, now);
        assert!(attr.values.is_empty());
        assert_eq!(attr.updated_at, now);
        assert_eq!(attr.created_at, before);
    }

    #[test]
    fn test_sku_patch_only_touches_present_fields() {
        let mut sku = Skus::fixtures().remove(0);
        let model = sku.model.clone();
        let patch = SkuPatch {
            number_in_stock: Some(" 7 ".into()),
            ..Default::default()
        };
        Skus::apply_patch(&mut sku, &patch, Utc::now());
        assert_eq!(sku.model, model);
        assert_eq!(sku.number_in_stock, "7");
    }
}
