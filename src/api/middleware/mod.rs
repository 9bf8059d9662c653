pub mod auth;

pub use auth::{AdminToken, admin_auth};
