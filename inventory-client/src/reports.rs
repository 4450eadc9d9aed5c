//! Aggregates over cached lists. An unfetched list counts as empty.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{Expense, OrderRecord, Receivable};
use crate::store::EntityStore;

pub const UNCATEGORIZED: &str = "uncategorized";

pub fn expenses_by_category(expenses: &EntityStore<Expense>) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for expense in expenses.items().unwrap_or_default() {
        let category = expense
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        *totals.entry(category.to_string()).or_insert(Decimal::ZERO) += expense.amount;
    }
    totals
}

/// Customers with nothing outstanding are left out.
pub fn outstanding_by_customer(receivables: &EntityStore<Receivable>) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for receivable in receivables.items().unwrap_or_default() {
        let outstanding = receivable.outstanding();
        if !outstanding.is_zero() {
            *totals
                .entry(receivable.customer.clone())
                .or_insert(Decimal::ZERO) += outstanding;
        }
    }
    totals
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderSummary {
    pub count: usize,
    pub revenue: Decimal,
}

pub fn summarize_orders<O: OrderRecord>(orders: &EntityStore<O>) -> OrderSummary {
    orders
        .items()
        .unwrap_or_default()
        .iter()
        .fold(OrderSummary::default(), |summary, order| OrderSummary {
            count: summary.count + 1,
            revenue: summary.revenue + order.body().total,
        })
}
