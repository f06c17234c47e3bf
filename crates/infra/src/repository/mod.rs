//! Repository abstractions for the store's relational data.
//!
//! Each trait has a Postgres implementation (`postgres`) and an in-memory one
//! (`in_memory`) used by tests and local development.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use petstore_auth::User;
use petstore_invoicing::Invoice;
use petstore_orders::Order;
use petstore_pets::{Pet, PetStatus};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryInvoices, InMemoryOrders, InMemoryPets, InMemoryUsers};
pub use postgres::{PostgresInvoices, PostgresOrders, PostgresPets, PostgresUsers};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound(_))
    }
}

#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> RepoResult<Pet>;
    async fn find_by_status(&self, status: PetStatus) -> RepoResult<Vec<Pet>>;
    /// Pets carrying every one of `tags`.
    async fn find_by_tags(&self, tags: &[String]) -> RepoResult<Vec<Pet>>;
    /// Insert a pet; its category and tags are found or created by name.
    async fn create(&self, pet: Pet) -> RepoResult<Pet>;
    async fn update(&self, pet: Pet) -> RepoResult<Pet>;
    async fn delete(&self, id: i32) -> RepoResult<()>;
    /// Number of pets per status.
    async fn count_by_status(&self) -> RepoResult<BTreeMap<PetStatus, i64>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> RepoResult<Order>;
    /// Orders whose ship date is strictly after `bound`. Empty when none match.
    async fn shipped_after(&self, bound: DateTime<Utc>) -> RepoResult<Vec<Order>>;
    async fn create(&self, order: Order) -> RepoResult<Order>;
    async fn update(&self, order: Order) -> RepoResult<Order>;
    async fn delete(&self, id: i32) -> RepoResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> RepoResult<User>;
    async fn find_by_email(&self, email: &str) -> RepoResult<User>;
    async fn create(&self, user: User) -> RepoResult<User>;
    /// Insert a batch of users atomically.
    async fn create_many(&self, users: Vec<User>) -> RepoResult<Vec<User>>;
    async fn update_by_username(&self, username: &str, user: User) -> RepoResult<User>;
    async fn delete_by_username(&self, username: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, invoice: Invoice) -> RepoResult<Invoice>;
}
