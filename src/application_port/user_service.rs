use crate::domain_model::{DocumentId, Uid, User, UserAuth};
use crate::domain_port::{DocumentStoreError, IdentityProviderError};

/// Collection the profile records are written to.
pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("not found{}", suffix(.0))]
    NotFound(Option<String>),
    #[error("unauthorized{}", suffix(.0))]
    Unauthorized(Option<String>),
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
    #[error(transparent)]
    Identity(#[from] IdentityProviderError),
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserErrorKind {
    NotFound,
    Unauthorized,
    Unclassified,
}

impl UserError {
    pub fn kind(&self) -> UserErrorKind {
        match self {
            UserError::NotFound(_) => UserErrorKind::NotFound,
            UserError::Unauthorized(_) => UserErrorKind::Unauthorized,
            _ => UserErrorKind::Unclassified,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            UserError::NotFound(m) | UserError::Unauthorized(m) => m.as_deref(),
            _ => None,
        }
    }
}

fn suffix(message: &Option<String>) -> String {
    match message.as_deref() {
        Some(m) if !m.is_empty() => format!(": {m}"),
        _ => String::new(),
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Persist a profile record; returns the id the document store assigned.
    async fn create_user(&self, user: &User) -> Result<DocumentId, UserError>;
    /// Register an authentication identity; returns the provider uid.
    async fn create_user_auth(&self, user_auth: &UserAuth) -> Result<Uid, UserError>;
    async fn get_user_auth_instance_by_email(&self, email: &str) -> Result<Uid, UserError>;
    /// Verify a bearer token; returns the uid it carries.
    async fn authorization(&self, token: &str) -> Result<Uid, UserError>;
}
