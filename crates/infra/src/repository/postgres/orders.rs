use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use petstore_orders::{Order, OrderStatus, ship_date};

use super::decode_error;
use crate::repository::{OrderRepository, RepoError, RepoResult};

const SELECT_ORDERS: &str =
    "SELECT id, pet_id, quantity, ship_date, complete, status FROM orders";

#[derive(Debug, Clone)]
pub struct PostgresOrders {
    pool: PgPool,
}

impl PostgresOrders {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> RepoResult<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: row.try_get("id")?,
            pet_id: row.try_get("pet_id")?,
            quantity: row.try_get("quantity")?,
            ship_date: ship_date::from_unix(row.try_get("ship_date")?),
            complete: row.try_get("complete")?,
            status: status.parse::<OrderStatus>().map_err(decode_error)?,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrders {
    async fn find_by_id(&self, id: i32) -> RepoResult<Order> {
        let row = sqlx::query(&format!("{SELECT_ORDERS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound("order"))?;
        Self::map_row(&row)
    }

    async fn shipped_after(&self, bound: DateTime<Utc>) -> RepoResult<Vec<Order>> {
        let rows = sqlx::query(&format!("{SELECT_ORDERS} WHERE ship_date > $1 ORDER BY ship_date, id"))
            .bind(bound.timestamp())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn create(&self, mut order: Order) -> RepoResult<Order> {
        let row = sqlx::query(
            "INSERT INTO orders (pet_id, quantity, ship_date, complete, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(order.pet_id)
        .bind(order.quantity)
        .bind(order.ship_date.timestamp())
        .bind(order.complete)
        .bind(order.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        order.id = row.try_get("id")?;
        Ok(order)
    }

    async fn update(&self, order: Order) -> RepoResult<Order> {
        let res = sqlx::query(
            "UPDATE orders SET pet_id = $1, quantity = $2, ship_date = $3, complete = $4, status = $5
             WHERE id = $6",
        )
        .bind(order.pet_id)
        .bind(order.quantity)
        .bind(order.ship_date.timestamp())
        .bind(order.complete)
        .bind(order.status.as_str())
        .bind(order.id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound("order"));
        }
        Ok(order)
    }

    async fn delete(&self, id: i32) -> RepoResult<()> {
        let res = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound("order"));
        }
        Ok(())
    }
}
