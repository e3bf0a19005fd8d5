use crate::domain_model::{Document, DocumentId};
use crate::domain_port::*;
use dashmap::DashMap;
use nanoid::nanoid;
use std::sync::Arc;

const AUTO_ID_ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b',
    'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z',
];
const AUTO_ID_LEN: usize = 20;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, Arc<MemoryCollection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str, id: &DocumentId) -> Option<Document> {
        let collection = self.collections.get(collection)?.value().clone();
        let document = collection.documents.get(id).map(|d| d.value().clone());
        document
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    fn collection_handle(&self, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryCollection {
                    name: name.to_string(),
                    documents: DashMap::new(),
                })
            })
            .value()
            .clone()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        self.collection_handle(name)
    }
}

pub struct MemoryCollection {
    name: String,
    documents: DashMap<DocumentId, Document>,
}

#[async_trait::async_trait]
impl Collection for MemoryCollection {
    async fn add(&self, document: Document) -> Result<DocumentId, DocumentStoreError> {
        if document.is_empty() {
            return Err(DocumentStoreError::InvalidDocument(
                "document has no fields".to_string(),
            ));
        }
        if document.keys().any(|k| k.is_empty()) {
            return Err(DocumentStoreError::InvalidDocument(
                "field names must not be empty".to_string(),
            ));
        }

        loop {
            let id = DocumentId(nanoid!(AUTO_ID_LEN, &AUTO_ID_ALPHABET));
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.documents.entry(id.clone()) {
                slot.insert(document);
                tracing::trace!(collection = %self.name, %id, "document stored");
                return Ok(id);
            }
        }
    }
}
