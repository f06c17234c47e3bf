//! `petstore-auth`: users, password hashing and JWT-backed sessions.
//!
//! No HTTP or storage types appear here: callers pass
//! the credential they received and get back tokens and coarse statuses.

pub mod claims;
pub mod config;
pub mod error;
pub mod session;
pub mod user;

pub use claims::{Claims, IssuedToken, TokenError, TokenIssuer};
pub use config::{AuthBackend, AuthConfig};
pub use error::AuthError;
pub use session::{AuthStatus, SessionStore};
pub use user::{User, hash_password, verify_password};
