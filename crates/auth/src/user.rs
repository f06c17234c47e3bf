//! Store users and their credentials.

use serde::{Deserialize, Serialize};

use petstore_core::{DomainError, DomainResult};

use crate::AuthError;

const MIN_USERNAME_LEN: usize = 6;
const MIN_PASSWORD_LEN: usize = 6;

/// A registered store user.
///
/// `password` is accepted on input but never serialized back out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: i32,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub user_status: i32,
}

impl User {
    pub fn validate(&self) -> DomainResult<()> {
        if self.username.chars().count() < MIN_USERNAME_LEN {
            return Err(DomainError::validation(
                "Username must not be less than 6 characters",
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(
                "Password must not be less than 6 characters",
            ));
        }
        Ok(())
    }

    /// Replace the plain-text password with its bcrypt hash.
    pub fn hash_password(&mut self, cost: u32) -> Result<(), AuthError> {
        self.password = hash_password(&self.password, cost)?;
        Ok(())
    }

    pub fn password_matches(&self, plain: &str) -> bool {
        verify_password(plain, &self.password)
    }
}

pub fn hash_password(plain: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// Constant-time bcrypt comparison; a corrupt hash never matches.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_user(username: &str, password: &str) -> User {
        User {
            username: username.into(),
            password: password.into(),
            email: format!("{username}@example.com"),
            ..User::default()
        }
    }

    #[test]
    fn password_is_never_serialized() {
        let json = serde_json::to_value(test_user("johnny", "hunter22")).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "johnny");
        assert_eq!(json["userStatus"], 0);
    }

    #[test]
    fn password_is_accepted_on_input() {
        let user: User =
            serde_json::from_str(r#"{"username":"johnny","password":"hunter22","firstName":"John"}"#)
                .unwrap();
        assert_eq!(user.password, "hunter22");
        assert_eq!(user.first_name, "John");
    }

    #[test]
    fn hashed_password_verifies() {
        let mut user = test_user("johnny", "hunter22");
        user.hash_password(4).unwrap();

        assert_ne!(user.password, "hunter22");
        assert!(user.password_matches("hunter22"));
        assert!(!user.password_matches("hunter23"));
    }

    #[test]
    fn corrupt_hash_never_matches() {
        assert!(!verify_password("hunter22", "not-a-bcrypt-hash"));
    }

    proptest! {
        #[test]
        fn short_usernames_are_rejected(name in "[a-z]{0,5}") {
            prop_assert!(test_user(&name, "hunter22").validate().is_err());
        }

        #[test]
        fn short_passwords_are_rejected(pw in "[a-z0-9]{0,5}") {
            prop_assert!(test_user("johnny", &pw).validate().is_err());
        }

        #[test]
        fn long_enough_credentials_pass(name in "[a-z]{6,20}", pw in "[a-z0-9]{6,20}") {
            prop_assert!(test_user(&name, &pw).validate().is_ok());
        }
    }
}
