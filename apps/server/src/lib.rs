//! # merceria-server
//!
//! REST adapter over the Merceria POS sale coordinator and stores.
//!
//! - [`config`] - `MERCERIA_*` environment configuration
//! - [`error`] - HTTP error body and status mapping
//! - [`state`] - Shared handler state
//! - [`routes`] - Router and handlers

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use routes::router;
pub use state::AppState;
