pub mod auth;
pub mod user;

pub use auth::{login, request_otp};
pub use user::{create_user, delete_user, get_user, list_users, update_user};
