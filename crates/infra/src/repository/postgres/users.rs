use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use petstore_auth::User;

use super::map_unique_violation;
use crate::repository::{RepoError, RepoResult, UserRepository};

const SELECT_USERS: &str = "
    SELECT id, username, first_name, last_name, email, password, phone, user_status
    FROM users";

#[derive(Debug, Clone)]
pub struct PostgresUsers {
    pool: PgPool,
}

impl PostgresUsers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> RepoResult<User> {
        let text = |col: &str| -> RepoResult<String> {
            Ok(row.try_get::<Option<String>, _>(col)?.unwrap_or_default())
        };
        Ok(User {
            id: row.try_get("id")?,
            username: text("username")?,
            first_name: text("first_name")?,
            last_name: text("last_name")?,
            email: row.try_get("email")?,
            password: text("password")?,
            phone: text("phone")?,
            user_status: row.try_get::<Option<i32>, _>("user_status")?.unwrap_or_default(),
        })
    }

    async fn find_one(&self, column: &str, value: &str) -> RepoResult<User> {
        let row = sqlx::query(&format!("{SELECT_USERS} WHERE {column} = $1"))
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound("user"))?;
        Self::map_row(&row)
    }
}

async fn insert_user(conn: &mut PgConnection, mut user: User) -> RepoResult<User> {
    let row = sqlx::query(
        "INSERT INTO users (username, first_name, last_name, email, password, phone, user_status)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.phone)
    .bind(user.user_status)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_unique_violation)?;
    user.id = row.try_get("id")?;
    Ok(user)
}

#[async_trait]
impl UserRepository for PostgresUsers {
    async fn find_by_username(&self, username: &str) -> RepoResult<User> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<User> {
        self.find_one("email", email).await
    }

    async fn create(&self, user: User) -> RepoResult<User> {
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, user).await
    }

    async fn create_many(&self, users: Vec<User>) -> RepoResult<Vec<User>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(users.len());
        for user in users {
            created.push(insert_user(&mut tx, user).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn update_by_username(&self, username: &str, mut user: User) -> RepoResult<User> {
        let row = sqlx::query(
            "UPDATE users
             SET username = $1, first_name = $2, last_name = $3, email = $4,
                 password = $5, phone = $6, user_status = $7
             WHERE username = $8
             RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.phone)
        .bind(user.user_status)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?
        .ok_or(RepoError::NotFound("user"))?;
        user.id = row.try_get("id")?;
        Ok(user)
    }

    async fn delete_by_username(&self, username: &str) -> RepoResult<()> {
        let res = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound("user"));
        }
        Ok(())
    }
}
