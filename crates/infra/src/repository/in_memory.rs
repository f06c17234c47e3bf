//! In-memory repositories for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use petstore_auth::User;
use petstore_invoicing::Invoice;
use petstore_orders::Order;
use petstore_pets::{Pet, PetStatus};

use super::{
    InvoiceRepository, OrderRepository, PetRepository, RepoError, RepoResult, UserRepository,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Rows keyed by a serial id, the way a `SERIAL PRIMARY KEY` table hands them out.
#[derive(Debug)]
struct Table<V> {
    rows: BTreeMap<i32, V>,
    next_id: i32,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<V> Table<V> {
    fn next_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Debug, Default)]
struct PetTables {
    pets: Table<Pet>,
    categories: HashMap<String, i32>,
    tags: HashMap<String, i32>,
    next_category_id: i32,
    next_tag_id: i32,
}

impl PetTables {
    /// Resolve category and tag ids by name, creating missing ones.
    fn resolve_names(&mut self, pet: &mut Pet) {
        let next = &mut self.next_category_id;
        pet.category.id = *self
            .categories
            .entry(pet.category.name.clone())
            .or_insert_with(|| {
                *next += 1;
                *next
            });

        for tag in &mut pet.tags {
            let next = &mut self.next_tag_id;
            tag.id = *self.tags.entry(tag.name.clone()).or_insert_with(|| {
                *next += 1;
                *next
            });
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPets {
    inner: Mutex<PetTables>,
}

impl InMemoryPets {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PetRepository for InMemoryPets {
    async fn find_by_id(&self, id: i32) -> RepoResult<Pet> {
        lock(&self.inner)
            .pets
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound("pet"))
    }

    async fn find_by_status(&self, status: PetStatus) -> RepoResult<Vec<Pet>> {
        Ok(lock(&self.inner)
            .pets
            .rows
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_tags(&self, tags: &[String]) -> RepoResult<Vec<Pet>> {
        Ok(lock(&self.inner)
            .pets
            .rows
            .values()
            .filter(|p| p.has_all_tags(tags))
            .cloned()
            .collect())
    }

    async fn create(&self, mut pet: Pet) -> RepoResult<Pet> {
        let mut tables = lock(&self.inner);
        tables.resolve_names(&mut pet);
        pet.id = tables.pets.next_id();
        tables.pets.rows.insert(pet.id, pet.clone());
        Ok(pet)
    }

    async fn update(&self, mut pet: Pet) -> RepoResult<Pet> {
        let mut tables = lock(&self.inner);
        if !tables.pets.rows.contains_key(&pet.id) {
            return Err(RepoError::NotFound("pet"));
        }
        tables.resolve_names(&mut pet);
        tables.pets.rows.insert(pet.id, pet.clone());
        Ok(pet)
    }

    async fn delete(&self, id: i32) -> RepoResult<()> {
        lock(&self.inner)
            .pets
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound("pet"))
    }

    async fn count_by_status(&self) -> RepoResult<BTreeMap<PetStatus, i64>> {
        let mut counts = BTreeMap::new();
        for pet in lock(&self.inner).pets.rows.values() {
            *counts.entry(pet.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOrders {
    inner: Mutex<Table<Order>>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn find_by_id(&self, id: i32) -> RepoResult<Order> {
        lock(&self.inner)
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound("order"))
    }

    async fn shipped_after(&self, bound: DateTime<Utc>) -> RepoResult<Vec<Order>> {
        Ok(lock(&self.inner)
            .rows
            .values()
            .filter(|o| o.shipped_after(bound))
            .cloned()
            .collect())
    }

    async fn create(&self, mut order: Order) -> RepoResult<Order> {
        let mut table = lock(&self.inner);
        order.id = table.next_id();
        table.rows.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update(&self, order: Order) -> RepoResult<Order> {
        let mut table = lock(&self.inner);
        match table.rows.get_mut(&order.id) {
            Some(row) => {
                *row = order.clone();
                Ok(order)
            }
            None => Err(RepoError::NotFound("order")),
        }
    }

    async fn delete(&self, id: i32) -> RepoResult<()> {
        lock(&self.inner)
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound("order"))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsers {
    inner: Mutex<Table<User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_unique(table: &Table<User>, user: &User, skip_id: Option<i32>) -> RepoResult<()> {
    for row in table.rows.values().filter(|r| Some(r.id) != skip_id) {
        if row.username == user.username {
            return Err(RepoError::Duplicate("username"));
        }
        if row.email == user.email {
            return Err(RepoError::Duplicate("email"));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_username(&self, username: &str) -> RepoResult<User> {
        lock(&self.inner)
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(RepoError::NotFound("user"))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<User> {
        lock(&self.inner)
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepoError::NotFound("user"))
    }

    async fn create(&self, mut user: User) -> RepoResult<User> {
        let mut table = lock(&self.inner);
        ensure_unique(&table, &user, None)?;
        user.id = table.next_id();
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_many(&self, users: Vec<User>) -> RepoResult<Vec<User>> {
        let mut table = lock(&self.inner);
        let mut staged = Table {
            rows: table.rows.clone(),
            next_id: table.next_id,
        };

        let mut created = Vec::with_capacity(users.len());
        for mut user in users {
            ensure_unique(&staged, &user, None)?;
            user.id = staged.next_id();
            staged.rows.insert(user.id, user.clone());
            created.push(user);
        }

        *table = staged;
        Ok(created)
    }

    async fn update_by_username(&self, username: &str, mut user: User) -> RepoResult<User> {
        let mut table = lock(&self.inner);
        let id = table
            .rows
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id)
            .ok_or(RepoError::NotFound("user"))?;

        ensure_unique(&table, &user, Some(id))?;
        user.id = id;
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn delete_by_username(&self, username: &str) -> RepoResult<()> {
        let mut table = lock(&self.inner);
        let id = table
            .rows
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id)
            .ok_or(RepoError::NotFound("user"))?;
        table.rows.remove(&id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryInvoices {
    inner: Mutex<Table<Invoice>>,
}

impl InMemoryInvoices {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn newest(&self) -> Option<Invoice> {
        lock(&self.inner)
            .rows
            .values()
            .max_by_key(|i| (i.created_date, i.id))
            .cloned()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoices {
    async fn create(&self, mut invoice: Invoice) -> RepoResult<Invoice> {
        let mut table = lock(&self.inner);
        invoice.id = table.next_id();
        table.rows.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }
}
