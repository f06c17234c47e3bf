//! Request/response bodies that differ from the domain types.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use petstore_core::DomainResult;
use petstore_core::error::ensure_positive_id;
use petstore_orders::{Order, OrderStatus};
use petstore_pets::{Category, Pet, PetStatus, Tag};

/// Status envelope: `{"code": 404, "type": "Not Found", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            kind: status.canonical_reason().unwrap_or_default().to_string(),
            message: message.into(),
        }
    }
}

/// Pet body. `status` stays a string so an unknown value is a validation
/// failure rather than a JSON rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetRequest {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub category: Category,
}

impl PetRequest {
    pub fn into_pet(self) -> DomainResult<Pet> {
        let status: PetStatus = self.status.parse()?;
        let mut pet = Pet::new(self.name, status, self.category).with_tags(self.tags);
        pet.id = self.id;
        pet.photo_urls = self.photo_urls;
        pet.validate()?;
        Ok(pet)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub id: i32,
    pub pet_id: i32,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub complete: bool,
}

impl OrderRequest {
    /// Build the order; the ship date is always stamped server-side.
    pub fn into_order(self, now: DateTime<Utc>) -> DomainResult<Order> {
        let status: OrderStatus = self.status.parse()?;
        let mut order = Order::new(self.pet_id, self.quantity, status, now);
        order.id = self.id;
        order.complete = self.complete;
        order.stamp_shipped(now);
        order.validate()?;
        Ok(order)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Form fields accepted by `POST /pet/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetForm {
    pub name: Option<String>,
    pub status: Option<String>,
}

/// Parse a path id, rejecting non-numeric and non-positive values.
pub fn parse_id(raw: &str) -> DomainResult<i32> {
    let id = raw
        .parse::<i32>()
        .map_err(|_| petstore_core::DomainError::invalid_id(raw))?;
    ensure_positive_id(id)
}
