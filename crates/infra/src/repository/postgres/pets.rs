use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::debug;

use petstore_pets::{Category, Pet, PetStatus, Tag};

use super::decode_error;
use crate::repository::{PetRepository, RepoError, RepoResult};

const SELECT_PETS: &str = "
    SELECT p.id, p.name, p.status, p.photo_urls, c.id AS category_id, c.name AS category_name
    FROM pets p
    LEFT JOIN categories c ON p.category_id = c.id";

#[derive(Debug, Clone)]
pub struct PostgresPets {
    pool: PgPool,
}

impl PostgresPets {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> RepoResult<Pet> {
        let status: String = row.try_get("status")?;
        Ok(Pet {
            id: row.try_get("id")?,
            name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
            status: status.parse::<PetStatus>().map_err(decode_error)?,
            photo_urls: row
                .try_get::<Option<Vec<String>>, _>("photo_urls")?
                .unwrap_or_default(),
            tags: Vec::new(),
            category: Category {
                id: row.try_get::<Option<i32>, _>("category_id")?.unwrap_or_default(),
                name: row
                    .try_get::<Option<String>, _>("category_name")?
                    .unwrap_or_default(),
            },
        })
    }

    /// Load tags for every pet in `pets` with one query.
    async fn attach_tags(&self, mut pets: Vec<Pet>) -> RepoResult<Vec<Pet>> {
        if pets.is_empty() {
            return Ok(pets);
        }
        let ids: Vec<i32> = pets.iter().map(|p| p.id).collect();

        let rows = sqlx::query(
            "SELECT pt.pet_id, t.id, t.name
             FROM pet_tag pt
             JOIN tags t ON t.id = pt.tag_id
             WHERE pt.pet_id = ANY($1)
             ORDER BY t.id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_pet: HashMap<i32, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_pet.entry(row.try_get("pet_id")?).or_default().push(Tag {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            });
        }
        for pet in &mut pets {
            pet.tags = by_pet.remove(&pet.id).unwrap_or_default();
        }
        Ok(pets)
    }

    async fn fetch_pets(&self, query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>) -> RepoResult<Vec<Pet>> {
        let rows = query.fetch_all(&self.pool).await?;
        let pets = rows.iter().map(Self::map_row).collect::<RepoResult<Vec<_>>>()?;
        self.attach_tags(pets).await
    }
}

async fn find_or_create_category(conn: &mut PgConnection, name: &str) -> RepoResult<i32> {
    let row = sqlx::query(
        "WITH ins AS (
             INSERT INTO categories (name) VALUES ($1)
             ON CONFLICT (name) DO NOTHING
             RETURNING id
         )
         SELECT id FROM ins
         UNION ALL
         SELECT id FROM categories WHERE name = $1
         LIMIT 1",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.try_get("id")?)
}

async fn find_or_create_tags(conn: &mut PgConnection, tags: &mut [Tag]) -> RepoResult<()> {
    for tag in tags.iter_mut() {
        let row = sqlx::query(
            "WITH ins AS (
                 INSERT INTO tags (name) VALUES ($1)
                 ON CONFLICT (name) DO NOTHING
                 RETURNING id
             )
             SELECT id FROM ins
             UNION ALL
             SELECT id FROM tags WHERE name = $1
             LIMIT 1",
        )
        .bind(&tag.name)
        .fetch_one(&mut *conn)
        .await?;
        tag.id = row.try_get("id")?;
    }
    Ok(())
}

async fn replace_tag_links(conn: &mut PgConnection, pet_id: i32, tags: &[Tag]) -> RepoResult<()> {
    sqlx::query("DELETE FROM pet_tag WHERE pet_id = $1")
        .bind(pet_id)
        .execute(&mut *conn)
        .await?;

    for tag in tags {
        sqlx::query("INSERT INTO pet_tag (pet_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(pet_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl PetRepository for PostgresPets {
    async fn find_by_id(&self, id: i32) -> RepoResult<Pet> {
        let query = format!("{SELECT_PETS} WHERE p.id = $1");
        let pet = self
            .fetch_pets(sqlx::query(&query).bind(id))
            .await?
            .pop()
            .ok_or(RepoError::NotFound("pet"))?;
        Ok(pet)
    }

    async fn find_by_status(&self, status: PetStatus) -> RepoResult<Vec<Pet>> {
        let query = format!("{SELECT_PETS} WHERE p.status = $1 ORDER BY p.id");
        self.fetch_pets(sqlx::query(&query).bind(status.as_str())).await
    }

    async fn find_by_tags(&self, tags: &[String]) -> RepoResult<Vec<Pet>> {
        let query = format!(
            "{SELECT_PETS}
             WHERE $1::text[] <@ ARRAY(
                 SELECT t.name FROM pet_tag pt JOIN tags t ON t.id = pt.tag_id
                 WHERE pt.pet_id = p.id
             )
             ORDER BY p.id"
        );
        self.fetch_pets(sqlx::query(&query).bind(tags.to_vec())).await
    }

    async fn create(&self, mut pet: Pet) -> RepoResult<Pet> {
        let mut tx = self.pool.begin().await?;

        pet.category.id = find_or_create_category(&mut tx, &pet.category.name).await?;
        find_or_create_tags(&mut tx, &mut pet.tags).await?;

        let row = sqlx::query(
            "INSERT INTO pets (name, status, photo_urls, category_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&pet.name)
        .bind(pet.status.as_str())
        .bind(&pet.photo_urls)
        .bind(pet.category.id)
        .fetch_one(&mut *tx)
        .await?;
        pet.id = row.try_get("id")?;

        replace_tag_links(&mut tx, pet.id, &pet.tags).await?;
        tx.commit().await?;

        debug!(pet_id = pet.id, "pet created");
        Ok(pet)
    }

    async fn update(&self, mut pet: Pet) -> RepoResult<Pet> {
        let mut tx = self.pool.begin().await?;

        pet.category.id = find_or_create_category(&mut tx, &pet.category.name).await?;
        find_or_create_tags(&mut tx, &mut pet.tags).await?;

        let updated = sqlx::query(
            "UPDATE pets SET name = $1, status = $2, photo_urls = $3, category_id = $4
             WHERE id = $5",
        )
        .bind(&pet.name)
        .bind(pet.status.as_str())
        .bind(&pet.photo_urls)
        .bind(pet.category.id)
        .bind(pet.id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound("pet"));
        }

        replace_tag_links(&mut tx, pet.id, &pet.tags).await?;
        tx.commit().await?;
        Ok(pet)
    }

    async fn delete(&self, id: i32) -> RepoResult<()> {
        let res = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound("pet"));
        }
        Ok(())
    }

    async fn count_by_status(&self) -> RepoResult<BTreeMap<PetStatus, i64>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM pets GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let status: String = row.try_get("status")?;
            let status = status.parse::<PetStatus>().map_err(decode_error)?;
            counts.insert(status, row.try_get::<i64, _>("n")?);
        }
        Ok(counts)
    }
}
