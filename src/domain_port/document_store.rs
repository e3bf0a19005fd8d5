use crate::domain_model::{Document, DocumentId};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// A named collection of records inside a document store.
#[async_trait::async_trait]
pub trait Collection: Send + Sync {
    /// Insert `document` and return the id the store assigned to it.
    async fn add(&self, document: Document) -> Result<DocumentId, DocumentStoreError>;
}

pub trait DocumentStore: Send + Sync {
    fn collection(&self, name: &str) -> Arc<dyn Collection>;
}
