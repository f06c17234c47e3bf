use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use petstore_orders::{Order, total_quantity};

/// Data handed to the invoice template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceReport {
    pub orders: Vec<Order>,
    pub date: String,
    pub total_quantity: i64,
}

impl InvoiceReport {
    pub fn new(orders: Vec<Order>, generated_at: DateTime<Utc>) -> Self {
        let total_quantity = total_quantity(&orders);
        Self {
            orders,
            date: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            total_quantity,
        }
    }

    /// Object name the report is uploaded under.
    pub fn filename(&self) -> String {
        format!("invoice_{}.md", self.date)
    }
}
