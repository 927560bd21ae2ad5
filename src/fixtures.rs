// =============================================================================
// FIXTURES MODULE
// =============================================================================
// Static catalog used when the API is unreachable (fallback strategy) or
// when the client runs in fixture mode. Also the lookup lists offered by the
// filter forms.
// =============================================================================

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;

use crate::models::{Attribute, AttributeType, Product, ProductStatus, Sku};

pub const PRODUCT_CATEGORIES: &[&str] = &["Electronics", "Clothing", "Home", "Sports"];
pub const PRODUCT_BRANDS: &[&str] = &["Acme", "Northwind", "Globex", "Initech"];

pub fn attribute_types() -> Vec<String> {
    AttributeType::ALL.iter().map(|t| t.as_str().to_string()).collect()
}

pub fn product_categories() -> Vec<String> {
    PRODUCT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

pub fn product_brands() -> Vec<String> {
    PRODUCT_BRANDS.iter().map(|b| b.to_string()).collect()
}

/// 2024-01-15T09:00:00Z plus `days`.
fn stamp(days: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_705_309_200 + days * 86_400, 0).unwrap_or_default()
}

fn attribute(id: &str, name: &str, kind: AttributeType, values: &[&str], required: bool, day: i64) -> Attribute {
    Attribute {
        id: id.to_string(),
        name: name.to_string(),
        attr_type: kind,
        values: values.iter().map(|v| v.to_string()).collect(),
        required,
        created_at: stamp(day),
        updated_at: stamp(day),
    }
}

pub fn attributes() -> Vec<Attribute> {
    vec![
        attribute("attr-1", "Color", AttributeType::Dropdown, &["Red", "Blue", "Black"], true, 0),
        attribute("attr-2", "Size", AttributeType::Dropdown, &["S", "M", "L", "XL"], false, 1),
        attribute("attr-3", "Weight", AttributeType::Number, &[], false, 2),
        attribute("attr-4", "Material", AttributeType::Text, &[], false, 3),
        attribute("attr-5", "Waterproof", AttributeType::Boolean, &[], false, 4),
        attribute("attr-6", "Release date", AttributeType::Date, &[], false, 5),
    ]
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: &str,
    name: &str,
    sku: &str,
    category: &str,
    brand: &str,
    price: f64,
    stock: u32,
    status: ProductStatus,
    attributes: BTreeMap<String, serde_json::Value>,
    day: i64,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        sku: sku.to_string(),
        skus_ids: vec![sku.to_string()],
        description: None,
        category: category.to_string(),
        brand: brand.to_string(),
        price,
        stock,
        status,
        attributes,
        created_at: stamp(day),
        updated_at: stamp(day),
    }
}

pub fn products() -> Vec<Product> {
    let attrs = |pairs: &[(&str, serde_json::Value)]| -> BTreeMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };
    vec![
        product(
            "prod-1",
            "Wireless Headphones",
            "sku-1",
            "Electronics",
            "Acme",
            89.99,
            25,
            ProductStatus::Active,
            attrs(&[("Color", json!("Black")), ("Weight", json!(250))]),
            0,
        ),
        product(
            "prod-2",
            "Running Jacket",
            "sku-2",
            "Clothing",
            "Northwind",
            129.0,
            4,
            ProductStatus::Active,
            attrs(&[("Size", json!("M")), ("Waterproof", json!(true))]),
            1,
        ),
        product(
            "prod-3",
            "Ceramic Mug",
            "sku-3",
            "Home",
            "Globex",
            12.5,
            0,
            ProductStatus::OutOfStock,
            attrs(&[("Color", json!("Red"))]),
            2,
        ),
        product(
            "prod-4",
            "Yoga Mat",
            "sku-4",
            "Sports",
            "Initech",
            45.0,
            60,
            ProductStatus::Inactive,
            attrs(&[("Material", json!("Cork"))]),
            3,
        ),
    ]
}

fn sku(id: &str, model: &str, price: &str, stock: &str, day: i64) -> Sku {
    Sku {
        id: id.to_string(),
        model: model.to_string(),
        price: price.to_string(),
        number_in_stock: stock.to_string(),
        created_at: stamp(day),
        updated_at: stamp(day),
    }
}

pub fn skus() -> Vec<Sku> {
    vec![
        sku("sku-1", "WH-1000", "89.99", "25", 0),
        sku("sku-2", "RJ-M-BLU", "129.00", "4", 1),
        sku("sku-3", "MUG-RED", "12.50", "0", 2),
        sku("sku-4", "YM-CORK", "45.00", "60", 3),
        sku("sku-5", "TV-OLED-65", "1499.00", "2", 4),
    ]
}
