use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use petstore_core::{DomainError, DomainResult};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Approved,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Approved => "approved",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "placed" => Ok(OrderStatus::Placed),
            "approved" => Ok(OrderStatus::Approved),
            "delivered" => Ok(OrderStatus::Delivered),
            _ => Err(DomainError::validation("not allowed status for order model")),
        }
    }
}

/// A purchase order for a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i32,
    pub pet_id: i32,
    pub quantity: i32,
    #[serde(with = "crate::ship_date")]
    pub ship_date: DateTime<Utc>,
    pub complete: bool,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(pet_id: i32, quantity: i32, status: OrderStatus, ship_date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            pet_id,
            quantity,
            ship_date,
            complete: false,
            status,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 1 {
            return Err(DomainError::validation("invalid quantity"));
        }
        Ok(())
    }

    /// Stamp the server-side ship time (unix-second precision, as stored).
    pub fn stamp_shipped(&mut self, now: DateTime<Utc>) {
        self.ship_date = crate::ship_date::from_unix(now.timestamp());
    }

    pub fn shipped_after(&self, bound: DateTime<Utc>) -> bool {
        self.ship_date > bound
    }
}

/// Sum of quantities across a batch of orders.
pub fn total_quantity<'a>(orders: impl IntoIterator<Item = &'a Order>) -> i64 {
    orders.into_iter().map(|o| i64::from(o.quantity)).sum()
}
