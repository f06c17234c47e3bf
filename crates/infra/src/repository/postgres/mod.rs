//! Postgres-backed repositories.
//!
//! Queries are built at runtime (`sqlx::query` + `Row::try_get`), so the crate
//! compiles without a live database.

use sqlx::error::BoxDynError;

use super::RepoError;

mod invoices;
mod orders;
mod pets;
mod users;

pub use invoices::PostgresInvoices;
pub use orders::PostgresOrders;
pub use pets::PostgresPets;
pub use users::PostgresUsers;

/// Wrap a column value that failed domain parsing as a decode error.
fn decode_error(err: impl Into<BoxDynError>) -> RepoError {
    RepoError::Database(sqlx::Error::Decode(err.into()))
}

/// Translate unique-constraint violations into `RepoError::Duplicate`.
fn map_unique_violation(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => "email",
                Some(c) if c.contains("username") => "username",
                _ => "record",
            };
            return RepoError::Duplicate(field);
        }
    }
    RepoError::Database(err)
}
