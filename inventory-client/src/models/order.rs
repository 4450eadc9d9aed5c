//! Purchase and sales orders share a body and differ in which party they
//! reference and how they touch stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::party::{Customer, PartyRecord, Vendor};
use crate::api::{Entity, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub product: String,
    pub quantity: u32,
    pub item_price: Decimal,
    pub total_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    #[serde(default)]
    pub products: Vec<OrderLine>,
    pub total: Decimal,
    #[serde(default)]
    pub remarks: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
}

/// A persisted order document.
pub trait OrderRecord: Resource {
    fn from_parts(id: Option<String>, party: Option<String>, body: OrderBody) -> Self;
    fn party_id(&self) -> Option<&str>;
    fn body(&self) -> &OrderBody;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(flatten)]
    pub body: OrderBody,
}

impl Entity for PurchaseOrder {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for PurchaseOrder {
    const PATH: &'static str = "purchase-orders";
}

impl OrderRecord for PurchaseOrder {
    fn from_parts(id: Option<String>, party: Option<String>, body: OrderBody) -> Self {
        Self {
            id,
            vendor: party,
            body,
        }
    }

    fn party_id(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    fn body(&self) -> &OrderBody {
        &self.body
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(flatten)]
    pub body: OrderBody,
}

impl Entity for SalesOrder {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for SalesOrder {
    const PATH: &'static str = "sales-orders";
}

impl OrderRecord for SalesOrder {
    fn from_parts(id: Option<String>, party: Option<String>, body: OrderBody) -> Self {
        Self {
            id,
            customer: party,
            body,
        }
    }

    fn party_id(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    fn body(&self) -> &OrderBody {
        &self.body
    }
}

/// What adding a line item does to cached stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    None,
    Decrement,
}

/// Type-level description of an order flavour.
pub trait OrderKind: Send + Sync + 'static {
    type Party: PartyRecord;
    type Order: OrderRecord;

    const NAME: &'static str;
    /// Prefix of the permanent page route of a saved order.
    const ROUTE: &'static str;
    const STOCK_EFFECT: StockEffect;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Purchase;

impl OrderKind for Purchase {
    type Party = Vendor;
    type Order = PurchaseOrder;

    const NAME: &'static str = "purchase";
    const ROUTE: &'static str = "/purchase-orders";
    const STOCK_EFFECT: StockEffect = StockEffect::None;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sales;

impl OrderKind for Sales {
    type Party = Customer;
    type Order = SalesOrder;

    const NAME: &'static str = "sales";
    const ROUTE: &'static str = "/sales-orders";
    const STOCK_EFFECT: StockEffect = StockEffect::Decrement;
}
