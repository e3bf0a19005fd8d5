mod identity_provider_firebase;

pub use identity_provider_firebase::*;
