pub mod auth;
pub mod guard;

pub use auth::{authenticate_request, AuthUser};
pub use guard::require_authority;
