use crate::domain_model::{Document, DocumentId};
use crate::domain_port::*;
use mongodb::bson::{self, Bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Database};
use std::sync::Arc;
use tracing::info;

// server error codes
const UNAUTHORIZED: i32 = 13;
const DOCUMENT_VALIDATION_FAILURE: i32 = 121;

pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    pub fn new(database: Database) -> Self {
        MongoDocumentStore { database }
    }

    pub async fn connect(uri: &str, database: &str) -> anyhow::Result<Self> {
        info!(database, "connecting to MongoDB");
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);

        // fail fast on bad credentials or an unreachable server
        database.list_collection_names().await?;
        info!(database = database.name(), "connected to MongoDB");

        Ok(Self::new(database))
    }
}

impl DocumentStore for MongoDocumentStore {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        Arc::new(MongoCollection {
            inner: self.database.collection::<bson::Document>(name),
        })
    }
}

pub struct MongoCollection {
    inner: mongodb::Collection<bson::Document>,
}

#[async_trait::async_trait]
impl Collection for MongoCollection {
    async fn add(&self, document: Document) -> Result<DocumentId, DocumentStoreError> {
        let document = bson::to_document(&document)
            .map_err(|e| DocumentStoreError::InvalidDocument(e.to_string()))?;

        let result = self.inner.insert_one(document).await.map_err(map_error)?;

        Ok(inserted_id(result.inserted_id))
    }
}

fn inserted_id(id: Bson) -> DocumentId {
    match id {
        Bson::ObjectId(oid) => DocumentId(oid.to_hex()),
        Bson::String(s) => DocumentId(s),
        other => DocumentId(other.to_string()),
    }
}

fn map_error(err: mongodb::error::Error) -> DocumentStoreError {
    let message = err.to_string();
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. } => DocumentStoreError::PermissionDenied(message),
        ErrorKind::Command(c) if c.code == UNAUTHORIZED => {
            DocumentStoreError::PermissionDenied(message)
        }
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == DOCUMENT_VALIDATION_FAILURE => {
            DocumentStoreError::InvalidDocument(message)
        }
        ErrorKind::BsonSerialization(_) | ErrorKind::InvalidArgument { .. } => {
            DocumentStoreError::InvalidDocument(message)
        }
        ErrorKind::Write(_) | ErrorKind::Command(_) | ErrorKind::Internal { .. } => {
            DocumentStoreError::Internal(message)
        }
        _ => DocumentStoreError::Unavailable(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn object_id_is_rendered_as_hex() {
        let oid = ObjectId::parse_str("65f1c0ffee0000000000b1ce").unwrap();
        assert_eq!(
            inserted_id(Bson::ObjectId(oid)),
            DocumentId("65f1c0ffee0000000000b1ce".to_string())
        );
        assert_eq!(
            inserted_id(Bson::String("b1ceeda8".to_string())),
            DocumentId("b1ceeda8".to_string())
        );
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn inserts_into_running_mongodb() {
        let uri =
            std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let store = MongoDocumentStore::connect(&uri, "profile_service_test")
            .await
            .unwrap();

        let document = serde_json::json!({ "email": "generic@generic.com.br" })
            .as_object()
            .cloned()
            .unwrap();
        let id = store.collection("users").add(document).await.unwrap();

        assert_eq!(id.as_str().len(), 24);
    }
}
