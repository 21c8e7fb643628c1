//! # merceria-db: Database Layer for Merceria POS
//!
//! SQLite storage for the shop, and the one place a sale touches it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Merceria POS Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   merceria-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ Coordinator   │───►│  UnitOfWork   │───►│   Ledger     │  │   │
//! │  │   │ preview       │    │ one sqlx tx   │    │ guarded      │  │   │
//! │  │   │ commit/cancel │    │               │    │ deltas       │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼───────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ Repositories  │    │   Database    │    │  Migrations  │  │   │
//! │  │   │ products      │───►│   (pool.rs)   │    │  (embedded)  │  │   │
//! │  │   │ users, sales  │    │  SqlitePool   │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Catalog, account and sale stores
//! - [`ledger`] - Inventory ledger
//! - [`unit_of_work`] - Transaction handle used by the coordinator
//! - [`coordinator`] - Sale transaction coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use merceria_db::{Database, DbConfig, SaleCoordinator, SaleRequest};
//!
//! let db = Database::new(DbConfig::new("merceria.db")).await?;
//! let coordinator = SaleCoordinator::new(db.clone(), TaxRate::default());
//!
//! let sale = coordinator.commit(&SaleRequest::new(items), cashier_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use coordinator::{CommittedSale, SaleCoordinator, SaleRequest};
pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use ledger::{Availability, InventoryLedger, StockAdjustment};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::product::{NewProduct, ProductRepository, ProductUpdate};
pub use repository::sale::{SaleRepository, SalesStats, StatsOverview, TopProduct};
pub use repository::user::{NewUser, UserRepository};
