use sea_orm::ConnectionTrait;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::stock_item;
use crate::entities::{StockStatus, TransactionType, WarehouseType};
use crate::errors::ServiceError;
use crate::services::ledger::{NewLedgerEntry, TransactionLedger};
use crate::services::stock_store::StockStore;

fn require_reason(reason: &str) -> Result<String, ServiceError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(
            "a non-empty reason is required for deletion".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// The only two ways a stock item leaves active inventory.
///
/// Soft delete is a reversible status flip; hard delete removes the row after
/// a compensating ledger entry has fully accounted for the quantity. In both
/// cases the ledger entry is written first: a failure there aborts before any
/// stock mutation, so a row is never hidden or removed without an audit
/// trail.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletionPolicy {
    store: StockStore,
    ledger: TransactionLedger,
}

impl DeletionPolicy {
    pub fn new(store: StockStore, ledger: TransactionLedger) -> Self {
        Self { store, ledger }
    }

    /// Reversible deletion: one zero-delta `SoftDeletion` entry, then the
    /// status transition. The stock is hidden, not consumed.
    #[instrument(skip(self, conn, reason))]
    pub async fn soft_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
        reason: &str,
        target_status: StockStatus,
        operator: &str,
    ) -> Result<(stock_item::Model, i64), ServiceError> {
        let reason = require_reason(reason)?;
        if !target_status.is_soft_delete_target() {
            return Err(ServiceError::InvalidOperation(format!(
                "soft delete cannot transition an item to {target_status}"
            )));
        }

        let item = self.store.get_required(conn, warehouse, id).await?;
        if item.status != StockStatus::Available {
            return Err(ServiceError::InvalidOperation(format!(
                "only available items can be soft-deleted, item is {}",
                item.status
            )));
        }

        let entry = self
            .ledger
            .record(
                conn,
                NewLedgerEntry {
                    warehouse,
                    item_id: id,
                    transaction_type: TransactionType::SoftDeletion,
                    quantity_delta: 0,
                    unit_price: item.unit_purchase_price,
                    description: reason,
                    operator: operator.to_string(),
                },
            )
            .await?;

        let updated = self.store.set_status(conn, warehouse, id, target_status).await?;
        info!(%warehouse, %id, status = %target_status, "Stock item soft-deleted");
        Ok((updated, entry.id))
    }

    /// Reverses a soft delete: one zero-delta `Restoration` entry, then the
    /// status returns to `Available`. Quantity and prices are untouched.
    #[instrument(skip(self, conn))]
    pub async fn restore<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
        operator: &str,
    ) -> Result<(stock_item::Model, i64), ServiceError> {
        let item = self.store.get_required(conn, warehouse, id).await?;
        if !item.status.is_soft_delete_target() {
            return Err(ServiceError::InvalidOperation(format!(
                "only soft-deleted items can be restored, item is {}",
                item.status
            )));
        }

        let entry = self
            .ledger
            .record(
                conn,
                NewLedgerEntry {
                    warehouse,
                    item_id: id,
                    transaction_type: TransactionType::Restoration,
                    quantity_delta: 0,
                    unit_price: item.unit_purchase_price,
                    description: format!("restored from {}", item.status),
                    operator: operator.to_string(),
                },
            )
            .await?;

        let updated = self
            .store
            .set_status(conn, warehouse, id, StockStatus::Available)
            .await?;
        info!(%warehouse, %id, "Stock item restored");
        Ok((updated, entry.id))
    }

    /// First phase of a hard delete: the snapshot a caller shows to a human
    /// before committing. No state changes.
    pub async fn preview_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
    ) -> Result<stock_item::Model, ServiceError> {
        self.store.get_required(conn, warehouse, id).await
    }

    /// Second phase: snapshot quantity and purchase price, append the
    /// compensating `Deletion` entry (`delta = -quantity`), then remove the
    /// row. Strict ordering; if removal ever fails after the entry committed,
    /// the ledger is authoritative and `remove` is retried idempotently.
    /// An administrative purge: the item's status is not consulted, so
    /// scrapped or sold items can still be removed.
    #[instrument(skip(self, conn, reason))]
    pub async fn confirm_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
        reason: &str,
        operator: &str,
    ) -> Result<(stock_item::Model, i64), ServiceError> {
        let reason = require_reason(reason)?;
        let snapshot = self.store.get_required(conn, warehouse, id).await?;

        let entry = self
            .ledger
            .record(
                conn,
                NewLedgerEntry {
                    warehouse,
                    item_id: id,
                    transaction_type: TransactionType::Deletion,
                    quantity_delta: -snapshot.quantity,
                    unit_price: snapshot.unit_purchase_price,
                    description: reason,
                    operator: operator.to_string(),
                },
            )
            .await?;

        self.store.remove(conn, warehouse, id).await?;
        info!(
            %warehouse,
            %id,
            removed_quantity = snapshot.quantity,
            "Stock item hard-deleted"
        );
        Ok((snapshot, entry.id))
    }
}
