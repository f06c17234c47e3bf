use async_trait::async_trait;
use sqlx::{PgPool, Row};

use petstore_invoicing::Invoice;

use crate::repository::{InvoiceRepository, RepoResult};

#[derive(Debug, Clone)]
pub struct PostgresInvoices {
    pool: PgPool,
}

impl PostgresInvoices {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoices {
    async fn create(&self, mut invoice: Invoice) -> RepoResult<Invoice> {
        let row = sqlx::query("INSERT INTO invoices (body, created_date) VALUES ($1, $2) RETURNING id")
            .bind(&invoice.body)
            .bind(invoice.created_date.timestamp())
            .fetch_one(&self.pool)
            .await?;
        invoice.id = row.try_get("id")?;
        Ok(invoice)
    }
}
