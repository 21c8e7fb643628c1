//! # Sale Transaction Coordinator
//!
//! Turns a cart into a committed sale, or reverses one.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Draft                                                                 │
//! │    │  commit(request, cashier_id)                                      │
//! │    ▼                                                                    │
//! │  Validating                                                            │
//! │    │  1. notes, cashier, every cart line    ──► CartInvalid            │
//! │    │  2. check_availability per product     ──► InsufficientStock      │
//! │    ▼                                                                    │
//! │  ┌──────────────────── UnitOfWork ─────────────────────┐               │
//! │  │  insert sale → insert N items → decrement M products│               │
//! │  │  any failure: rollback, nothing survives            │               │
//! │  └─────────────────────────────────────────────────────┘               │
//! │    │                        │                                          │
//! │    ▼                        ▼                                          │
//! │  Committed               Rejected (late race → InsufficientStock,      │
//! │                                    transient error → one retry)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The availability read in step 2 only exists to report every short line
//! at once. The guarded decrement inside the unit of work is what actually
//! stops two cashiers from selling the last unit twice.
//!
//! Cancellation runs in its own unit of work: stock for every line goes back
//! on the shelf and the sale row is deleted (items cascade). A sale that is
//! already gone reports `SaleNotFound`, so cancel cannot apply twice.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use chrono::Utc;
use merceria_core::cart::{aggregate_quantities, price_lines, validate_cart};
use merceria_core::pricing::change_due;
use merceria_core::validation::validate_notes;
use merceria_core::{
    CartItem, CoreError, Money, PaymentMethod, Quantity, SalePreview, SaleRecord, SaleState,
    TaxRate, ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::pool::Database;
use crate::unit_of_work::{NewSale, UnitOfWork};

/// Attempts made at the atomic unit before a transient failure is surfaced.
pub const MAX_COMMIT_ATTEMPTS: u32 = 2;

/// Inbound cart submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleRequest {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Cash handed over by the customer, if the cashier entered it.
    #[serde(default)]
    pub tendered: Option<Decimal>,
}

impl SaleRequest {
    pub fn new(items: Vec<CartItem>) -> Self {
        SaleRequest {
            items,
            ..Default::default()
        }
    }
}

/// A committed sale plus the change to hand back, when cash was tendered.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedSale {
    #[serde(flatten)]
    pub record: SaleRecord,
    pub change_cents: Option<i64>,
}

/// Orchestrates validation, stock checks and the atomic write of a sale.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    db: Database,
    tax_rate: TaxRate,
}

impl SaleCoordinator {
    pub fn new(db: Database, tax_rate: TaxRate) -> Self {
        SaleCoordinator { db, tax_rate }
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Prices a cart against the current catalog without touching anything.
    pub async fn preview(&self, items: &[CartItem]) -> ServiceResult<SalePreview> {
        let (preview, _) = self.validate_and_price(items).await?;
        Ok(preview)
    }

    async fn validate_and_price(
        &self,
        items: &[CartItem],
    ) -> ServiceResult<(SalePreview, BTreeMap<i64, Quantity>)> {
        let mut ids: Vec<i64> = items
            .iter()
            .map(|item| item.product_id)
            .filter(|id| *id > 0)
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let catalog = if ids.is_empty() {
            HashMap::new()
        } else {
            self.db.products().get_many(&ids).await?
        };

        let lines = validate_cart(items, &catalog)?;
        let preview = price_lines(&lines, self.tax_rate);
        Ok((preview, aggregate_quantities(&lines)))
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Validates, checks stock and writes the sale as one unit.
    pub async fn commit(&self, request: &SaleRequest, cashier_id: i64) -> ServiceResult<CommittedSale> {
        let mut state = SaleState::Draft;
        transition(&mut state, SaleState::Validating, cashier_id);

        match self.prepare(request, cashier_id).await {
            Ok(prepared) => {
                let result =
                    retry_transient("commit", || self.try_commit(&prepared, cashier_id)).await;
                match &result {
                    Ok(committed) => {
                        transition(&mut state, SaleState::Committed, cashier_id);
                        info!(
                            sale_id = committed.record.sale.id,
                            cashier_id,
                            total = %committed.record.sale.total(),
                            lines = committed.record.items.len(),
                            payment = %committed.record.sale.payment_method,
                            "Sale committed"
                        );
                    }
                    Err(err) => reject(&mut state, cashier_id, err),
                }
                result
            }
            Err(err) => {
                reject(&mut state, cashier_id, &err);
                Err(err)
            }
        }
    }

    /// Everything that can be decided before the first write.
    async fn prepare(&self, request: &SaleRequest, cashier_id: i64) -> ServiceResult<PreparedSale> {
        let notes = validate_notes(request.notes.as_deref())?;

        self.db
            .users()
            .get_active(cashier_id)
            .await?
            .ok_or(CoreError::UserNotFound(cashier_id))?;

        let (preview, quantities) = self.validate_and_price(&request.items).await?;

        let change = match request.tendered {
            None => None,
            Some(raw) => {
                let tendered = Money::from_decimal(raw).ok_or_else(|| ValidationError::InvalidFormat {
                    field: "tendered".to_string(),
                    reason: "at most two decimal places".to_string(),
                })?;
                Some(change_due(preview.total(), tendered)?)
            }
        };

        let ledger = self.db.ledger();
        let mut shortages = Vec::new();
        for (&product_id, &requested) in &quantities {
            let availability = ledger.check_availability(product_id, requested).await?;
            shortages.extend(availability.shortage(requested));
        }
        if !shortages.is_empty() {
            return Err(CoreError::InsufficientStock { shortages }.into());
        }

        Ok(PreparedSale {
            preview,
            quantities,
            notes,
            payment_method: request.payment_method,
            change,
        })
    }

    async fn try_commit(&self, prepared: &PreparedSale, cashier_id: i64) -> ServiceResult<CommittedSale> {
        let preview = &prepared.preview;
        let mut uow = UnitOfWork::begin(self.db.pool()).await?;

        // The first write takes SQLite's write lock for the whole unit.
        let sale = uow
            .insert_sale(&NewSale {
                created_at: Utc::now(),
                total_cents: preview.total_cents,
                subtotal_cents: preview.subtotal_cents,
                tax_cents: preview.tax_cents,
                payment_method: prepared.payment_method,
                notes: prepared.notes.as_deref(),
                cashier_id,
            })
            .await?;

        let mut items = Vec::with_capacity(preview.lines.len());
        for line in &preview.lines {
            items.push(uow.insert_line_item(sale.id, line).await?);
        }

        for (&product_id, &quantity) in &prepared.quantities {
            let remaining = uow.decrement_stock(product_id, quantity).await?;
            debug!(sale_id = sale.id, product_id, sold = %quantity, %remaining, "Stock decremented");
        }

        uow.commit().await?;

        Ok(CommittedSale {
            record: SaleRecord { sale, items },
            change_cents: prepared.change.map(|c| c.cents()),
        })
    }

    // =========================================================================
    // Cancel
    // =========================================================================

    /// Restores stock for every line and removes the sale.
    pub async fn cancel(&self, sale_id: i64) -> ServiceResult<SaleRecord> {
        let record = retry_transient("cancel", || self.try_cancel(sale_id)).await?;

        // The row is gone; the log line is what remains of it.
        let snapshot = serde_json::to_string(&record).unwrap_or_default();
        info!(
            sale_id,
            total = %record.sale.total(),
            from = ?SaleState::Committed,
            to = ?SaleState::Cancelled,
            record = %snapshot,
            "Sale cancelled"
        );
        Ok(record)
    }

    async fn try_cancel(&self, sale_id: i64) -> ServiceResult<SaleRecord> {
        let mut uow = UnitOfWork::begin(self.db.pool()).await?;

        let sale = uow.sale(sale_id).await?.ok_or(CoreError::SaleNotFound(sale_id))?;
        let items = uow.sale_items(sale_id).await?;

        let mut returned: BTreeMap<i64, Quantity> = BTreeMap::new();
        for item in &items {
            *returned.entry(item.product_id).or_insert_with(Quantity::zero) += item.quantity();
        }
        for (&product_id, &quantity) in &returned {
            let stock = uow.increment_stock(product_id, quantity).await?;
            debug!(sale_id, product_id, returned = %quantity, %stock, "Stock restored");
        }

        if !uow.delete_sale(sale_id).await? {
            return Err(CoreError::SaleNotFound(sale_id).into());
        }
        uow.commit().await?;

        Ok(SaleRecord { sale, items })
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// A committed sale with its items; `SaleNotFound` once cancelled.
    pub async fn get_sale(&self, sale_id: i64) -> ServiceResult<SaleRecord> {
        self.db
            .sales()
            .get_record(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id).into())
    }
}

struct PreparedSale {
    preview: SalePreview,
    quantities: BTreeMap<i64, Quantity>,
    notes: Option<String>,
    payment_method: PaymentMethod,
    change: Option<Money>,
}

/// Runs `attempt` again after a transient persistence failure, up to
/// [`MAX_COMMIT_ATTEMPTS`] runs in total. Client faults and fatal storage
/// errors come back from the first run.
async fn retry_transient<T, F, Fut>(operation: &str, mut attempt: F) -> ServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let mut run = 1;
    loop {
        match attempt().await {
            Err(ServiceError::Persistence(err)) if err.is_transient() && run < MAX_COMMIT_ATTEMPTS => {
                warn!(operation, attempt = run, error = %err, "Transient failure, retrying");
                run += 1;
            }
            result => return result,
        }
    }
}

fn transition(state: &mut SaleState, next: SaleState, cashier_id: i64) {
    debug_assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
    debug!(cashier_id, from = ?*state, to = ?next, "Sale state");
    *state = next;
}

fn reject(state: &mut SaleState, cashier_id: i64, err: &ServiceError) {
    transition(state, SaleState::Rejected, cashier_id);
    if err.is_client_fault() {
        warn!(cashier_id, error = %err, "Sale rejected");
    } else {
        warn!(cashier_id, error = ?err, "Sale failed on persistence");
    }
}
