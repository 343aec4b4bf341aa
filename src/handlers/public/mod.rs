// handlers/public/mod.rs - Public handlers (no bearer token)
//
// The webhook endpoint authenticates with a shared secret header instead.

pub mod health;
pub mod user;

pub use health::health;
pub use user::{user_register, user_sync};
