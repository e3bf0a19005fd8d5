mod document_store;
mod identity_provider;

pub use document_store::*;
pub use identity_provider::*;
