pub mod middleware;
pub mod models;

pub use middleware::{identity_middleware, require_admin, AuthState};
pub use models::{Identity, Role};
