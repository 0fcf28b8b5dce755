//! HTTP service for a single table of tasks, protected by HTTP Basic auth.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;

pub use config::{Config, Credentials};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use store::{Store, StoreError};
