pub mod finance;
pub mod order;
pub mod party;
pub mod product;
pub mod user;
pub mod warehouse;

pub use finance::{Expense, Receivable};
pub use order::{
    OrderBody, OrderKind, OrderLine, OrderRecord, Purchase, PurchaseOrder, Sales, SalesOrder,
    StockEffect,
};
pub use party::{Contact, Customer, PartyRecord, Vendor};
pub use product::{NewVariant, Product, StockLevel, StockTransfer, Variant};
pub use user::{Role, User};
pub use warehouse::Warehouse;
