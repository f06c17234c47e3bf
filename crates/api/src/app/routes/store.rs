use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tracing::info;

use petstore_pets::PetStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const ORDER_NOT_FOUND: &str = "Order not found";

/// Pet counts keyed by status; statuses without pets report zero.
pub async fn inventory(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let counts = match services.pets.count_by_status().await {
        Ok(counts) => counts,
        Err(e) => return errors::repo_error_to_response(e, "Inventory not found"),
    };
    let inventory: BTreeMap<&'static str, i64> = PetStatus::ALL
        .into_iter()
        .map(|status| (status.as_str(), counts.get(&status).copied().unwrap_or(0)))
        .collect();
    Json(inventory).into_response()
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::OrderRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(StatusCode::METHOD_NOT_ALLOWED, "Invalid Order");
    };
    let order = match body.into_order(Utc::now()) {
        Ok(order) => order,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.pets.find_by_id(order.pet_id).await {
        return errors::repo_error_to_response(e, "Pet with given id not found");
    }

    match services.orders.create(order).await {
        Ok(order) => {
            info!(order_id = order.id, pet_id = order.pet_id, quantity = order.quantity, "order placed");
            (StatusCode::CREATED, Json(order)).into_response()
        }
        Err(e) => errors::repo_error_to_response(e, ORDER_NOT_FOUND),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = dto::parse_id(&id) else {
        return errors::invalid_id();
    };
    match services.orders.find_by_id(id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::repo_error_to_response(e, ORDER_NOT_FOUND),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = dto::parse_id(&id) else {
        return errors::invalid_id();
    };
    match services.orders.delete(id).await {
        Ok(()) => {
            info!(order_id = id, "order deleted");
            errors::api_response(StatusCode::OK, "Order deleted")
        }
        Err(e) => errors::repo_error_to_response(e, ORDER_NOT_FOUND),
    }
}
