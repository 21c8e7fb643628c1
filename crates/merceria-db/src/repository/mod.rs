//! # Repository Module
//!
//! Stores for the records a sale reads. Stock never changes through here;
//! that belongs to the [`InventoryLedger`](crate::ledger::InventoryLedger).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.products()  ProductRepository   catalog lookups, admin edits       │
//! │  db.users()     UserRepository      cashier accounts                   │
//! │  db.sales()     SaleRepository      committed sales, reports           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
pub mod sale;
pub mod user;
