use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::{Entity, Resource};

/// Quantity on hand for one (warehouse, variant) bucket of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub quantity: i64,
}

impl StockLevel {
    fn matches(&self, warehouse: Option<&str>, variant: Option<&str>) -> bool {
        self.warehouse.as_deref() == warehouse && self.variant.as_deref() == variant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub stock: Vec<StockLevel>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: None,
            name: name.into(),
            sku: None,
            description: None,
            price,
            cost: None,
            stock: Vec::new(),
        }
    }

    /// Total quantity across every warehouse and variant.
    pub fn on_hand(&self) -> i64 {
        self.stock.iter().map(|level| level.quantity).sum()
    }

    pub fn stock_at(&self, warehouse: Option<&str>, variant: Option<&str>) -> i64 {
        self.stock
            .iter()
            .filter(|level| level.matches(warehouse, variant))
            .map(|level| level.quantity)
            .sum()
    }

    /// Apply `delta` to the matching bucket, opening one if none exists yet.
    pub fn adjust_stock(&mut self, warehouse: Option<&str>, variant: Option<&str>, delta: i64) {
        match self
            .stock
            .iter_mut()
            .find(|level| level.matches(warehouse, variant))
        {
            Some(level) => level.quantity += delta,
            None => self.stock.push(StockLevel {
                warehouse: warehouse.map(str::to_string),
                variant: variant.map(str::to_string),
                quantity: delta,
            }),
        }
    }
}

impl Entity for Product {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Product {
    const PATH: &'static str = "products";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub product: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl Entity for Variant {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Variant {
    const PATH: &'static str = "variants";
}

/// Body of `POST /products/:id/variants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewVariant {
    #[validate(length(min = 1, message = "Variant name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// Body of `POST /products/:id/transfers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "distinct_warehouses"))]
pub struct StockTransfer {
    #[validate(length(min = 1, message = "Source warehouse is required"))]
    pub from: String,
    #[validate(length(min = 1, message = "Destination warehouse is required"))]
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
}

fn distinct_warehouses(transfer: &StockTransfer) -> Result<(), ValidationError> {
    if transfer.from == transfer.to {
        let mut error = ValidationError::new("same_warehouse");
        error.message = Some("Source and destination must differ".into());
        return Err(error);
    }
    Ok(())
}
