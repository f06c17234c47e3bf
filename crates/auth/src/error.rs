use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The request carried no session credential at all.
    #[error("token is not present")]
    NoCredential,

    /// The credential does not map to an active session.
    #[error("no user present in system")]
    NotAuthenticated,

    #[error("session lifetime out of range")]
    TtlOutOfRange,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}
