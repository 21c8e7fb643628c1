//! # Receipt View
//!
//! The read-only shape handed to receipt and report generators. Built from a
//! committed [`SaleRecord`]; generators never write back.
//!
//! Amounts serialize as integer cents and quantities as integer
//! milli-units, the same scale used everywhere else in the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{PaymentMethod, SaleItem, SaleRecord, UnitOfMeasure};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub product_code: String,
    pub product_name: String,
    pub unit: UnitOfMeasure,
    pub quantity: Quantity,
    pub unit_price_charged: Money,
    pub was_override: bool,
    pub line_subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptView {
    pub id: i64,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub total: Money,
    pub subtotal: Money,
    pub tax: Money,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub line_items: Vec<ReceiptLine>,
}

impl From<&SaleItem> for ReceiptLine {
    fn from(item: &SaleItem) -> Self {
        ReceiptLine {
            product_code: item.code_snapshot.clone(),
            product_name: item.name_snapshot.clone(),
            unit: item.unit_snapshot,
            quantity: item.quantity(),
            unit_price_charged: item.unit_price(),
            was_override: item.was_override,
            line_subtotal: item.line_subtotal(),
        }
    }
}

impl From<&SaleRecord> for ReceiptView {
    fn from(record: &SaleRecord) -> Self {
        let sale = &record.sale;
        ReceiptView {
            id: sale.id,
            timestamp: sale.created_at,
            total: sale.total(),
            subtotal: Money::from_cents(sale.subtotal_cents),
            tax: Money::from_cents(sale.tax_cents),
            payment_method: sale.payment_method,
            notes: sale.notes.clone(),
            line_items: record.items.iter().map(ReceiptLine::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sale;

    #[test]
    fn test_receipt_from_record() {
        let record = SaleRecord {
            sale: Sale {
                id: 7,
                created_at: Utc::now(),
                total_cents: 3000,
                subtotal_cents: 2542,
                tax_cents: 458,
                payment_method: PaymentMethod::Card,
                notes: Some("regalo".to_string()),
                cashier_id: 1,
            },
            items: vec![SaleItem {
                id: 1,
                sale_id: 7,
                product_id: 2,
                code_snapshot: "B".to_string(),
                name_snapshot: "Botones".to_string(),
                unit_snapshot: UnitOfMeasure::Dozen,
                quantity_milli: 2000,
                unit_price_cents: 1500,
                line_subtotal_cents: 3000,
                was_override: true,
            }],
        };

        let receipt = ReceiptView::from(&record);
        assert_eq!(receipt.id, 7);
        assert_eq!(receipt.total, Money::from_cents(3000));
        assert_eq!(receipt.subtotal + receipt.tax, receipt.total);
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(receipt.line_items[0].quantity, Quantity::from_units(2));
        assert!(receipt.line_items[0].was_override);
        assert_eq!(record.items_total(), receipt.total);
    }
}
