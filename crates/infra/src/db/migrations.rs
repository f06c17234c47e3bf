//! Idempotent schema creation run at startup.

use sqlx::PgPool;
use tracing::info;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
             id SERIAL PRIMARY KEY,
             username VARCHAR(255) UNIQUE,
             first_name VARCHAR(255),
             last_name VARCHAR(255),
             email TEXT UNIQUE NOT NULL,
             password VARCHAR(255),
             phone VARCHAR(15),
             user_status INT
         )",
    ),
    (
        "categories",
        "CREATE TABLE IF NOT EXISTS categories (
             id SERIAL PRIMARY KEY,
             name VARCHAR(255) UNIQUE
         )",
    ),
    (
        "pets",
        "CREATE TABLE IF NOT EXISTS pets (
             id SERIAL PRIMARY KEY,
             category_id INT REFERENCES categories(id) ON DELETE CASCADE,
             name VARCHAR(255),
             photo_urls TEXT[],
             status VARCHAR(255)
         )",
    ),
    (
        "orders",
        "CREATE TABLE IF NOT EXISTS orders (
             id SERIAL PRIMARY KEY,
             quantity INT NOT NULL,
             ship_date BIGINT NOT NULL,
             complete BOOLEAN NOT NULL DEFAULT FALSE,
             status VARCHAR(255) NOT NULL,
             pet_id INT REFERENCES pets(id) ON DELETE CASCADE
         )",
    ),
    (
        "tags",
        "CREATE TABLE IF NOT EXISTS tags (
             id SERIAL PRIMARY KEY,
             name VARCHAR(255) UNIQUE
         )",
    ),
    (
        "pet_tag",
        "CREATE TABLE IF NOT EXISTS pet_tag (
             pet_id INT REFERENCES pets(id) ON DELETE CASCADE,
             tag_id INT REFERENCES tags(id) ON DELETE CASCADE,
             UNIQUE (pet_id, tag_id)
         )",
    ),
    (
        "invoices",
        "CREATE TABLE IF NOT EXISTS invoices (
             id SERIAL PRIMARY KEY,
             body TEXT,
             created_date BIGINT NOT NULL
         )",
    ),
    ("orders_ship_date_idx", "CREATE INDEX IF NOT EXISTS orders_ship_date_idx ON orders (ship_date)"),
];

pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("running migrations");
    for (name, statement) in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
        info!(object = name, "migrated");
    }
    info!("migrations complete");
    Ok(())
}
