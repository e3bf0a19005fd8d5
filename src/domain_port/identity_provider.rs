use crate::domain_model::{Uid, UserAuth};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityProviderError {
    #[error("email already in use")]
    EmailExists,
    #[error("invalid email")]
    InvalidEmail,
    #[error("weak password: {0}")]
    WeakPassword(String),
    #[error("identity not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new identity from the email, password and profile fields.
    async fn create_identity(&self, user_auth: &UserAuth) -> Result<Uid, IdentityProviderError>;

    async fn find_by_email(&self, email: &str) -> Result<Uid, IdentityProviderError>;

    /// Verify a bearer token and return the uid it was issued for.
    async fn verify_token(&self, token: &str) -> Result<Uid, IdentityProviderError>;
}
