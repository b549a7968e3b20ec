//! Pending auth request and its one-shot resolution.

mod context;
pub mod resolver;

pub use context::{AuthRequestContext, PendingAuthRequest};
pub use resolver::{AuthRequestResolver, ResolveError};
