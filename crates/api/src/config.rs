//! Process configuration, read from a TOML file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use petstore_auth::AuthConfig;
use petstore_infra::db::DbConfig;
use petstore_infra::storage::StorageConfig;
use petstore_infra::workers::WorkersConfig;

pub const CONFIG_ENV: &str = "PETSTORE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub workers: WorkersConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(with = "petstore_core::duration", default = "default_shutdown_timeout")]
    pub shutdown_timeout: Duration,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

impl Config {
    /// Load from `$PETSTORE_CONFIG`, falling back to `./config.toml`.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 9090
        shutdown_timeout = "5s"

        [db.postgres]
        dbname = "petstore"
        host = "localhost"
        port = 5432
        user = "postgres"
        password = "postgres"
        sslmode = "disable"

        [workers.invoice]
        interval = "1h"
        temp_dir = "tmp"

        [storage]
        backend = "minio"

        [storage.minio]
        host = "localhost"
        port = 9000
        access_key = "minio"
        secret_key = "minio123"

        [auth]
        backend = "jwt"
        secret = "change-me"
        ttl = "10m"
    "#;

    #[test]
    fn sample_config_parses() {
        let cfg = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.server.addr().unwrap().port(), 9090);
        assert_eq!(cfg.server.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(cfg.workers.invoice.interval, Duration::from_secs(3600));
        assert_eq!(cfg.auth.ttl, Duration::from_secs(600));
        assert!(matches!(cfg.storage, StorageConfig::Minio { .. }));
    }

    #[test]
    fn unsupported_auth_backend_fails_to_load() {
        let broken = SAMPLE.replace(r#"backend = "jwt""#, r#"backend = "ldap""#);
        assert!(Config::from_toml(&broken).is_err());
    }

    #[test]
    fn unsupported_storage_backend_fails_to_load() {
        let broken = SAMPLE.replace(r#"backend = "minio""#, r#"backend = "ftp""#);
        assert!(Config::from_toml(&broken).is_err());
    }

    #[test]
    fn timer_periods_must_be_positive() {
        let zero_ttl = SAMPLE.replace(r#"ttl = "10m""#, r#"ttl = "0s""#);
        assert!(Config::from_toml(&zero_ttl).is_err());

        let zero_interval = SAMPLE.replace(r#"interval = "1h""#, r#"interval = "0m""#);
        assert!(Config::from_toml(&zero_interval).is_err());
    }

    #[test]
    fn oversized_duration_is_an_error_not_a_panic() {
        let huge = SAMPLE.replace(r#"interval = "1h""#, r#"interval = "18446744073709551615h""#);
        let err = Config::from_toml(&huge).unwrap_err();
        assert!(format!("{err:#}").contains("too large"));
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.toml"));
    }
}
