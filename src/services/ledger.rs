use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::entities::stock_item;
use crate::entities::stock_transaction::{
    self, expected_total, Entity as StockTransaction, TransactionType,
};
use crate::entities::WarehouseType;
use crate::errors::ServiceError;

/// Input for one ledger append. `total_price` is always derived here, never
/// trusted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub warehouse: WarehouseType,
    pub item_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity_delta: i32,
    pub unit_price: Decimal,
    pub description: String,
    pub operator: String,
}

/// Additive filters for the reporting read path. Absent fields match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub warehouse: Option<WarehouseType>,
    pub transaction_type: Option<TransactionType>,
    pub recorded_from: Option<DateTime<Utc>>,
    pub recorded_to: Option<DateTime<Utc>>,
}

/// Outcome of comparing an edited item against its prior snapshot: the single
/// ledger entry the edit produces, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditReconciliation {
    pub transaction_type: TransactionType,
    pub quantity_delta: i32,
    pub unit_price: Decimal,
}

/// Decides what a completed edit writes to the ledger.
///
/// One entry per edit: a quantity change dominates and is recorded as
/// `InventoryEdit` carrying the new unit purchase price; a price-only change
/// is a zero-delta `PriceChange`; a metadata-only edit records nothing.
pub fn reconcile_edit(
    before: &stock_item::Model,
    after: &stock_item::Model,
) -> Option<EditReconciliation> {
    if before.quantity != after.quantity {
        return Some(EditReconciliation {
            transaction_type: TransactionType::InventoryEdit,
            quantity_delta: after.quantity - before.quantity,
            unit_price: after.unit_purchase_price,
        });
    }
    if before.unit_purchase_price != after.unit_purchase_price
        || before.unit_sale_price != after.unit_sale_price
    {
        return Some(EditReconciliation {
            transaction_type: TransactionType::PriceChange,
            quantity_delta: 0,
            unit_price: after.unit_purchase_price,
        });
    }
    None
}

/// Append-only audit trail of every quantity- or price-affecting event.
///
/// There is deliberately no update or delete operation; reconciliation and
/// reporting treat this table as the authority on what happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionLedger;

impl TransactionLedger {
    /// Validates and appends one entry.
    ///
    /// A failed append maps to [`ServiceError::LedgerWriteFailed`], which is
    /// fatal to the enclosing unit of work: no stock mutation may commit
    /// without its matching ledger entry.
    #[instrument(skip(self, conn, entry), fields(warehouse = %entry.warehouse, item_id = %entry.item_id, transaction_type = %entry.transaction_type))]
    pub async fn record<C: ConnectionTrait>(
        &self,
        conn: &C,
        entry: NewLedgerEntry,
    ) -> Result<stock_transaction::Model, ServiceError> {
        if entry.unit_price.is_sign_negative() {
            return Err(ServiceError::InvalidPrice(format!(
                "unit price must be >= 0, got {}",
                entry.unit_price
            )));
        }
        if entry.transaction_type.is_zero_delta() && entry.quantity_delta != 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "{} entries carry a zero quantity delta, got {}",
                entry.transaction_type, entry.quantity_delta
            )));
        }
        if entry.transaction_type.requires_reason() && entry.description.trim().is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "{} entries require an operator-supplied reason",
                entry.transaction_type
            )));
        }

        let total_price = if entry.transaction_type.is_zero_delta() {
            Decimal::ZERO
        } else {
            expected_total(entry.quantity_delta, entry.unit_price)
        };

        let active = stock_transaction::ActiveModel {
            warehouse: Set(entry.warehouse),
            item_id: Set(entry.item_id),
            transaction_type: Set(entry.transaction_type),
            quantity_delta: Set(entry.quantity_delta),
            unit_price: Set(entry.unit_price),
            total_price: Set(total_price),
            description: Set(entry.description),
            operator: Set(entry.operator),
            ..Default::default()
        };

        active.insert(conn).await.map_err(|e| {
            error!(error = %e, "Ledger append failed");
            ServiceError::LedgerWriteFailed(e.to_string())
        })
    }

    /// Full history of one item, oldest first. Survives the item's removal.
    pub async fn list_by_item<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        item_id: Uuid,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        let entries = StockTransaction::find()
            .filter(stock_transaction::Column::Warehouse.eq(warehouse))
            .filter(stock_transaction::Column::ItemId.eq(item_id))
            .order_by_asc(stock_transaction::Column::CreatedAt)
            .order_by_asc(stock_transaction::Column::Id)
            .all(conn)
            .await?;
        Ok(entries)
    }

    /// Filtered read path for reporting. Purely additive filters, no side
    /// effects.
    pub async fn list_by_filter<C: ConnectionTrait>(
        &self,
        conn: &C,
        filter: LedgerFilter,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        let mut query = StockTransaction::find();
        if let Some(warehouse) = filter.warehouse {
            query = query.filter(stock_transaction::Column::Warehouse.eq(warehouse));
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query.filter(stock_transaction::Column::TransactionType.eq(transaction_type));
        }
        if let Some(from) = filter.recorded_from {
            query = query.filter(stock_transaction::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.recorded_to {
            query = query.filter(stock_transaction::Column::CreatedAt.lt(to));
        }

        let entries = query
            .order_by_asc(stock_transaction::Column::CreatedAt)
            .order_by_asc(stock_transaction::Column::Id)
            .all(conn)
            .await?;
        Ok(entries)
    }

    /// Sum of all recorded deltas for one item. Equals the item's current
    /// quantity while the row exists; equals zero once a hard delete's
    /// compensating entry has landed.
    pub async fn running_sum<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        item_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let entries = self.list_by_item(conn, warehouse, item_id).await?;
        Ok(entries.iter().map(|e| i64::from(e.quantity_delta)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(quantity: i32, purchase: Decimal, sale: Decimal) -> stock_item::Model {
        stock_item::Model {
            id: Uuid::new_v4(),
            warehouse: WarehouseType::NewParts,
            quantity,
            unit_purchase_price: purchase,
            unit_sale_price: sale,
            status: crate::entities::StockStatus::Available,
            purchase_date: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
            location: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn quantity_change_dominates() {
        let before = item(10, dec!(50000), dec!(60000));
        let mut after = item(7, dec!(55000), dec!(60000));
        after.id = before.id;

        let outcome = reconcile_edit(&before, &after).unwrap();
        assert_eq!(outcome.transaction_type, TransactionType::InventoryEdit);
        assert_eq!(outcome.quantity_delta, -3);
        assert_eq!(outcome.unit_price, dec!(55000));
    }

    #[test]
    fn price_only_change_is_zero_delta() {
        let before = item(10, dec!(50000), dec!(60000));
        let mut after = item(10, dec!(50000), dec!(65000));
        after.id = before.id;

        let outcome = reconcile_edit(&before, &after).unwrap();
        assert_eq!(outcome.transaction_type, TransactionType::PriceChange);
        assert_eq!(outcome.quantity_delta, 0);
    }

    #[test]
    fn metadata_only_change_records_nothing() {
        let before = item(10, dec!(50000), dec!(60000));
        let mut after = before.clone();
        after.location = Some("shelf B3".to_string());
        assert_eq!(reconcile_edit(&before, &after), None);
    }
}
