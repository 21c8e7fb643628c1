//! # Application State
//!
//! Shared by every handler. Everything inside is cheap to clone: the
//! database handle and the coordinator both wrap the same connection pool.

use merceria_core::Quantity;
use merceria_db::{Database, SaleCoordinator};

use crate::config::ServerConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub coordinator: SaleCoordinator,
    /// Default threshold for the low-stock report.
    pub low_stock_threshold: Quantity,
}

impl AppState {
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        AppState {
            coordinator: SaleCoordinator::new(db.clone(), config.tax_rate()),
            low_stock_threshold: config.low_stock_threshold(),
            db,
        }
    }
}
