pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

pub use app::app;
pub use state::AppState;
