use std::time::Duration;

use serde::Deserialize;

/// Session backend. Only JWT sessions exist; any other value in the config
/// file fails deserialization and therefore startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthBackend {
    #[default]
    Jwt,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub backend: AuthBackend,

    /// HS256 signing secret.
    pub secret: String,

    /// Session lifetime; also the sweep period.
    #[serde(deserialize_with = "petstore_core::duration::deserialize_positive", default = "default_ttl")]
    pub ttl: Duration,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            backend: AuthBackend::Jwt,
            secret: secret.into(),
            ttl: default_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_secret_is_given() {
        let cfg: AuthConfig = serde_json::from_str(r#"{"secret":"s3cr3t"}"#).unwrap();
        assert_eq!(cfg.backend, AuthBackend::Jwt);
        assert_eq!(cfg.ttl, Duration::from_secs(600));
        assert_eq!(cfg.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let res = serde_json::from_str::<AuthConfig>(r#"{"secret":"x","ttl":"0s"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let res = serde_json::from_str::<AuthConfig>(r#"{"backend":"oauth","secret":"x"}"#);
        assert!(res.is_err());
    }
}
