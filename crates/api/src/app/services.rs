//! Service wiring: repositories, object storage and the session store.

use std::sync::Arc;

use sqlx::PgPool;

use petstore_auth::SessionStore;
use petstore_infra::repository::{
    InMemoryInvoices, InMemoryOrders, InMemoryPets, InMemoryUsers, InvoiceRepository,
    OrderRepository, PetRepository, PostgresInvoices, PostgresOrders, PostgresPets, PostgresUsers,
    UserRepository,
};
use petstore_infra::storage::ObjectStorage;

#[derive(Clone)]
pub struct AppServices {
    pub pets: Arc<dyn PetRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub sessions: Arc<SessionStore>,
    pub bcrypt_cost: u32,
}

impl AppServices {
    pub fn postgres(
        pool: PgPool,
        storage: Arc<dyn ObjectStorage>,
        sessions: Arc<SessionStore>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            pets: Arc::new(PostgresPets::new(pool.clone())),
            orders: Arc::new(PostgresOrders::new(pool.clone())),
            users: Arc::new(PostgresUsers::new(pool.clone())),
            invoices: Arc::new(PostgresInvoices::new(pool)),
            storage,
            sessions,
            bcrypt_cost,
        }
    }

    /// Process-local repositories, for tests and local runs without Postgres.
    pub fn in_memory(storage: Arc<dyn ObjectStorage>, sessions: Arc<SessionStore>, bcrypt_cost: u32) -> Self {
        Self {
            pets: Arc::new(InMemoryPets::new()),
            orders: Arc::new(InMemoryOrders::new()),
            users: Arc::new(InMemoryUsers::new()),
            invoices: Arc::new(InMemoryInvoices::new()),
            storage,
            sessions,
            bcrypt_cost,
        }
    }
}
