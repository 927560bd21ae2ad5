// =============================================================================
// PAGES MODULE
// =============================================================================
// Page controllers: the glue between a store, its filter debouncer and the
// editor forms. Rendering is someone else's job; these types expose exactly
// what a view needs to draw and the actions its widgets trigger.
//
// PAGES:
// - ResourcePage<R>  list page: mount, filter, paginate
// - AttributeEditor  create/edit an attribute, values from a key/value form
// - ProductEditor    create/edit a product, attribute map from a key/value form
// - SkuEditor        create/edit a SKU
// - DashboardPage    greeting
// =============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use crate::debounce::FilterDebouncer;
use crate::error::{ClientError, ClientResult};
use crate::filters::EntityFilter;
use crate::form::{DynamicKeyValueForm, FormRow};
use crate::models::{
    Attribute, AttributeDraft, AttributePatch, AttributeType, Product, ProductDraft, ProductPatch,
    ProductStatus, Sku, SkuDraft, SkuPatch,
};
use crate::resource::{Attributes, Products, Resource, Skus};
use crate::session::Session;
use crate::store::{FetchOutcome, RemoteResourceStore};

// =============================================================================
// LIST PAGE
// =============================================================================
pub struct ResourcePage<R: Resource> {
    store: RemoteResourceStore<R>,
    debouncer: FilterDebouncer<R::Filters>,
    /// Filter form as currently typed; reaches the store after the quiet period
    draft: R::Filters,
}

impl<R: Resource> ResourcePage<R> {
    /// Must be called inside a tokio runtime (spawns the debouncer).
    pub fn new(store: RemoteResourceStore<R>, quiet: Duration) -> Self {
        let draft = store.filters();
        Self {
            debouncer: FilterDebouncer::for_store(store.clone(), quiet),
            store,
            draft,
        }
    }

    pub fn store(&self) -> &RemoteResourceStore<R> {
        &self.store
    }

    pub fn draft(&self) -> &R::Filters {
        &self.draft
    }

    pub async fn mount(&self) -> FetchOutcome {
        tracing::debug!(resource = R::COLLECTION, "Mounting page");
        self.store.fetch().await
    }

    /// Applies a filter-form edit; the store sees it once typing pauses.
    pub fn edit_filters<F>(&mut self, update: F)
    where
        F: FnOnce(&mut R::Filters),
    {
        update(&mut self.draft);
        self.debouncer.edit(self.draft.clone());
    }

    /// Clears the filter form immediately, dropping any pending edit.
    pub async fn reset_filters(&mut self) -> FetchOutcome {
        self.debouncer.cancel();
        self.draft = R::Filters::default();
        self.store.reset_filters().await
    }

    /// Moves to `page`, optionally changing the page size.
    pub async fn apply_pagination(&self, page: u32, page_size: Option<u32>) -> FetchOutcome {
        self.store
            .set_pagination(|p| {
                p.page = page;
                if let Some(size) = page_size {
                    p.page_size = size;
                }
            })
            .await
    }

    /// Held rows that satisfy the committed filters.
    ///
    /// Some list endpoints ignore part of the criteria (SKUs take none at
    /// all), so the page narrows what the server returned.
    pub fn visible(&self) -> Vec<R::Entity> {
        let snapshot = self.store.snapshot();
        snapshot
            .items
            .into_iter()
            .filter(|entity| snapshot.filters.matches(entity))
            .collect()
    }
}

// =============================================================================
// ATTRIBUTE EDITOR
// =============================================================================
#[derive(Debug, Clone)]
pub struct AttributeEditor {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Enumerated values, one per row (value column)
    pub values: DynamicKeyValueForm,
    editing: Option<String>,
}

impl Default for AttributeEditor {
    fn default() -> Self {
        Self {
            name: String::new(),
            attr_type: AttributeType::Text,
            required: false,
            values: DynamicKeyValueForm::new(),
            editing: None,
        }
    }
}

impl AttributeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(attr: &Attribute) -> Self {
        Self {
            name: attr.name.clone(),
            attr_type: attr.attr_type,
            required: attr.required,
            values: DynamicKeyValueForm::from_pairs(
                attr.values.iter().map(|v| (String::new(), v.clone())),
            ),
            editing: Some(attr.id.clone()),
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn draft(&self) -> AttributeDraft {
        AttributeDraft {
            name: self.name.clone(),
            attr_type: self.attr_type,
            values: self.values.values(),
            required: self.required,
        }
    }

    pub fn patch(&self) -> AttributePatch {
        let mut draft = self.draft();
        draft.normalize();
        AttributePatch {
            name: Some(draft.name),
            attr_type: Some(draft.attr_type),
            values: Some(draft.values),
            required: Some(draft.required),
        }
    }

    /// Creates or updates through the store. The editor is cleared on
    /// success and left untouched on failure so the user can fix it.
    pub async fn save(&mut self, store: &RemoteResourceStore<Attributes>) -> ClientResult<Attribute> {
        let saved = match &self.editing {
            Some(id) => store.update(id, self.patch()).await?,
            None => store.create(self.draft()).await?,
        };
        *self = Self::new();
        Ok(saved)
    }
}

// =============================================================================
// PRODUCT EDITOR
// =============================================================================
#[derive(Debug, Clone)]
pub struct ProductEditor {
    pub name: String,
    pub sku: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub price: f64,
    pub stock: u32,
    pub status: ProductStatus,
    /// Attribute name / value rows
    pub attributes: DynamicKeyValueForm,
    editing: Option<String>,
}

impl Default for ProductEditor {
    fn default() -> Self {
        Self {
            name: String::new(),
            sku: String::new(),
            description: String::new(),
            category: String::new(),
            brand: String::new(),
            price: 0.0,
            stock: 0,
            status: ProductStatus::Active,
            attributes: DynamicKeyValueForm::new(),
            editing: None,
        }
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the attribute map from the form rows. Blank rows are skipped; a
/// value without a name is rejected with its 1-based row number.
fn attribute_map(rows: &[FormRow]) -> ClientResult<BTreeMap<String, serde_json::Value>> {
    let mut map = BTreeMap::new();
    for (index, row) in rows.iter().enumerate() {
        let name = row.name().trim();
        if name.is_empty() {
            if row.value().trim().is_empty() {
                continue;
            }
            return Err(ClientError::validation(
                "attributes",
                format!("row {} has a value but no name", index + 1),
            ));
        }
        map.insert(
            name.to_string(),
            serde_json::Value::String(row.value().to_string()),
        );
    }
    Ok(map)
}

impl ProductEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            sku: product.sku.clone(),
            description: product.description.clone().unwrap_or_default(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            price: product.price,
            stock: product.stock,
            status: product.status,
            attributes: DynamicKeyValueForm::from_pairs(
                product
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value_text(value))),
            ),
            editing: Some(product.id.clone()),
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    fn description(&self) -> Option<String> {
        let text = self.description.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Fails when an attribute row carries a value but no name.
    pub fn draft(&self) -> ClientResult<ProductDraft> {
        let attributes = attribute_map(self.attributes.rows())?;
        let sku = self.sku.trim().to_string();
        Ok(ProductDraft {
            name: self.name.clone(),
            skus_ids: if sku.is_empty() { Vec::new() } else { vec![sku.clone()] },
            sku,
            description: self.description(),
            category: self.category.clone(),
            brand: self.brand.clone(),
            price: self.price,
            stock: self.stock,
            status: self.status,
            attributes,
        })
    }

    pub fn patch(&self) -> ClientResult<ProductPatch> {
        let mut draft = self.draft()?;
        draft.normalize();
        Ok(ProductPatch {
            name: Some(draft.name),
            sku: Some(draft.sku),
            skus_ids: Some(draft.skus_ids),
            description: draft.description,
            category: Some(draft.category),
            brand: Some(draft.brand),
            price: Some(draft.price),
            stock: Some(draft.stock),
            status: Some(draft.status),
            attributes: Some(draft.attributes),
        })
    }

    /// Rows are checked before the store is touched, so a bad row leaves both
    /// the editor and the collection as they were.
    pub async fn save(&mut self, store: &RemoteResourceStore<Products>) -> ClientResult<Product> {
        let saved = match &self.editing {
            Some(id) => store.update(id, self.patch()?).await?,
            None => store.create(self.draft()?).await?,
        };
        *self = Self::new();
        Ok(saved)
    }
}

// =============================================================================
// SKU EDITOR
// =============================================================================
#[derive(Debug, Clone, Default)]
pub struct SkuEditor {
    pub model: String,
    pub price: String,
    pub number_in_stock: String,
    editing: Option<String>,
}

impl SkuEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(sku: &Sku) -> Self {
        Self {
            model: sku.model.clone(),
            price: sku.price.clone(),
            number_in_stock: sku.number_in_stock.clone(),
            editing: Some(sku.id.clone()),
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn draft(&self) -> SkuDraft {
        SkuDraft {
            model: self.model.clone(),
            price: self.price.clone(),
            number_in_stock: self.number_in_stock.clone(),
        }
    }

    pub fn patch(&self) -> SkuPatch {
        SkuPatch {
            model: Some(self.model.trim().to_string()),
            price: Some(self.price.trim().to_string()),
            number_in_stock: Some(self.number_in_stock.trim().to_string()),
        }
    }

    pub async fn save(&mut self, store: &RemoteResourceStore<Skus>) -> ClientResult<Sku> {
        let saved = match &self.editing {
            Some(id) => store.update(id, self.patch()).await?,
            None => store.create(self.draft()).await?,
        };
        *self = Self::new();
        Ok(saved)
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================
pub struct DashboardPage;

impl DashboardPage {
    pub fn greeting(session: &Session) -> String {
        match session.greeting_name() {
            Some(name) if !name.trim().is_empty() => format!("Hello, {}", name.trim()),
            _ => "Hello".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::form::FormField;
    use crate::notify::Notifier;
    use crate::source::FixtureSource;
    use std::sync::Arc;

    fn attribute_store() -> RemoteResourceStore<Attributes> {
        RemoteResourceStore::<Attributes>::new(
            Arc::new(FixtureSource::<Attributes>::new()),
            Notifier::new(),
            10,
        )
    }

    #[tokio::test]
    async fn test_attribute_editor_collects_value_column() {
        let store = attribute_store();
        let mut editor = AttributeEditor::new();
        editor.name = "Finish".into();
        editor.attr_type = AttributeType::Dropdown;
        editor.values.edit_cell(0, FormField::Value, "Matte").unwrap();
        editor.values.add_row();
        editor.values.edit_cell(1, FormField::Value, "Gloss").unwrap();

        let saved = editor.save(&store).await.unwrap();
        assert_eq!(saved.values, vec!["Matte", "Gloss"]);
        assert_eq!(editor.name, "");
        assert!(store.items().iter().any(|a| a.name == "Finish"));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_editor_state() {
        let store = attribute_store();
        let mut editor = AttributeEditor::new();
        editor.name = "Finish".into();
        editor.attr_type = AttributeType::Dropdown;

        let err = editor.save(&store).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "values", .. }));
        assert_eq!(editor.name, "Finish");
        assert_eq!(editor.attr_type, AttributeType::Dropdown);
    }

    #[tokio::test]
    async fn test_product_editor_round_trips_attributes() {
        let product = crate::fixtures::products().remove(0);
        let editor = ProductEditor::edit(&product);
        assert_eq!(editor.editing(), Some("prod-1"));

        let patch = editor.patch().unwrap();
        let attributes = patch.attributes.unwrap();
        assert_eq!(attributes["Color"], serde_json::json!("Black"));
        assert_eq!(attributes["Weight"], serde_json::json!("250"));
        assert_eq!(patch.description, None);
    }

    #[tokio::test]
    async fn test_product_editor_rejects_value_without_name() {
        let store = RemoteResourceStore::<Products>::new(
            Arc::new(FixtureSource::<Products>::new()),
            Notifier::new(),
            10,
        );
        store.fetch().await;
        let before = store.items();

        let mut editor = ProductEditor::new();
        editor.name = "Desk Lamp".into();
        editor.sku = "LAMP-01".into();
        editor.category = "Lighting".into();
        editor.brand = "Lumen".into();
        editor.price = 39.5;
        editor.attributes.edit_cell(0, FormField::Name, "Color").unwrap();
        editor.attributes.edit_cell(0, FormField::Value, "Black").unwrap();
        editor.attributes.add_row();
        editor.attributes.edit_cell(1, FormField::Value, "250g").unwrap();
        editor.attributes.add_row();

        let err = editor.draft().unwrap_err();
        match &err {
            ClientError::Validation { field, message } => {
                assert_eq!(*field, "attributes");
                assert_eq!(message, "row 2 has a value but no name");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = editor.save(&store).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "attributes", .. }));
        assert_eq!(editor.name, "Desk Lamp");
        assert_eq!(editor.attributes.rows()[1].value(), "250g");
        assert_eq!(store.items(), before);
    }

    #[test]
    fn test_product_editor_skips_blank_rows() {
        let mut editor = ProductEditor::new();
        editor.attributes.edit_cell(0, FormField::Name, "Color").unwrap();
        editor.attributes.edit_cell(0, FormField::Value, "Black").unwrap();
        editor.attributes.add_row();
        editor.attributes.add_row();

        let draft = editor.draft().unwrap();
        assert_eq!(draft.attributes.len(), 1);
        assert_eq!(draft.attributes["Color"], serde_json::json!("Black"));
    }

    #[tokio::test]
    async fn test_sku_editor_updates_existing() {
        let store = RemoteResourceStore::<Skus>::new(
            Arc::new(FixtureSource::<Skus>::new()),
            Notifier::new(),
            10,
        );
        store.fetch().await;
        let sku = store.items().remove(0);

        let mut editor = SkuEditor::edit(&sku);
        editor.number_in_stock = "99".into();
        let saved = editor.save(&store).await.unwrap();
        assert_eq!(saved.number_in_stock, "99");
        assert_eq!(editor.editing(), None);
        assert_eq!(store.items()[0].number_in_stock, "99");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resource_page_debounces_and_narrows() {
        let store = RemoteResourceStore::<Skus>::new(
            Arc::new(FixtureSource::<Skus>::new()),
            Notifier::new(),
            10,
        );
        let mut page = ResourcePage::new(store, Duration::from_millis(300));
        page.mount().await;
        assert_eq!(page.visible().len(), 5);

        page.edit_filters(|f| f.search = "m".into());
        page.edit_filters(|f| f.search = "mug".into());
        assert_eq!(page.store().filters().search, "");

        tokio::time::sleep(Duration::from_millis(350)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(page.store().filters().search, "mug");
        assert_eq!(page.visible().len(), 1);

        page.edit_filters(|f| f.search = "zzz".into());
        page.reset_filters().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(page.store().filters().search, "");
        assert_eq!(page.draft().search, "");
        assert_eq!(page.visible().len(), 5);
    }

    #[test]
    fn test_greeting() {
        let session = Session {
            token: Some("t".into()),
            user_name: Some("parnia".into()),
            display_name: None,
        };
        assert_eq!(DashboardPage::greeting(&session), "Hello, parnia");
        assert_eq!(DashboardPage::greeting(&Session::default()), "Hello");
    }
}
