//! Postgres connection pool and schema bootstrap.

use std::str::FromStr;

use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tracing::info;

pub mod migrations;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub dbname: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_port() -> u16 {
    5432
}

fn default_sslmode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl PostgresConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        let ssl_mode = PgSslMode::from_str(&self.sslmode)
            .map_err(|e| sqlx::Error::Configuration(e.into()))?;

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(ssl_mode))
    }
}

/// Open the pool; fails fast when the database is unreachable.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.connect_options()?)
        .await?;

    info!(host = %config.host, port = config.port, dbname = %config.dbname, "connected to postgres");
    Ok(pool)
}
