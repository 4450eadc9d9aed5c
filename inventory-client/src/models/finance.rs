use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{Entity, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Entity for Expense {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Expense {
    const PATH: &'static str = "expenses";
}

/// Money a customer still owes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub customer: String,
    pub amount: Decimal,
    #[serde(default)]
    pub paid: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Receivable {
    /// Never negative, even if the customer overpaid.
    pub fn outstanding(&self) -> Decimal {
        (self.amount - self.paid).max(Decimal::ZERO)
    }
}

impl Entity for Receivable {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Receivable {
    const PATH: &'static str = "receivables";
}
