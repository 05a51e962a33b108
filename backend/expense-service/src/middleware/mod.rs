pub mod identity;

pub use identity::{IdentityContext, IdentityMiddleware};
