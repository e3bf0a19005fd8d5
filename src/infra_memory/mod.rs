mod document_store_memory;
mod identity_provider_memory;

pub use document_store_memory::*;
pub use identity_provider_memory::*;
