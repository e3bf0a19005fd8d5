mod document_store_mongo;

pub use document_store_mongo::*;
