mod document;
mod identity;
mod user;

pub use document::*;
pub use identity::*;
pub use user::*;
