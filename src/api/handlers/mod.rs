pub mod auth;
pub mod health;

pub use self::health::{health, health_detailed, root};
