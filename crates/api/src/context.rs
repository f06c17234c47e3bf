use petstore_auth::User;

/// Authenticated session attached to a request by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user: User,
    token: String,
}

impl SessionContext {
    pub fn new(user: User, token: String) -> Self {
        Self { user, token }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}
