use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

use crate::calendar;
use crate::commands::stock::{
    ApplyEditCommand, ApplyEditResult, HardDeleteStockCommand, HardDeleteStockResult,
    RegisterPurchaseCommand, RegisterPurchaseResult, RestoreStockCommand, RestoreStockResult,
    SoftDeleteStockCommand, SoftDeleteStockResult,
};
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::{stock_item, stock_transaction, StockStatus, WarehouseType};
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::deletion::DeletionPolicy;
use crate::services::ledger::TransactionLedger;

/// User-facing projection of a stock item: the purchase date is rendered in
/// the Jalali calendar, the only representation operators ever see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItemView {
    pub id: Uuid,
    pub warehouse: WarehouseType,
    pub quantity: i32,
    pub unit_purchase_price: Decimal,
    pub unit_sale_price: Decimal,
    pub status: StockStatus,
    pub purchase_date: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl StockItemView {
    fn from_model(model: stock_item::Model) -> Result<Self, ServiceError> {
        Ok(Self {
            id: model.id,
            warehouse: model.warehouse,
            quantity: model.quantity,
            unit_purchase_price: model.unit_purchase_price,
            unit_sale_price: model.unit_sale_price,
            status: model.status,
            purchase_date: calendar::format_jalali(model.purchase_date)?,
            location: model.location,
            description: model.description,
        })
    }
}

/// Entry point used by all four warehouse form types.
///
/// Composes the store, ledger, and deletion policy behind the command layer
/// and serializes writers per `(warehouse, item_id)`: each mutating operation
/// is one database transaction guarded by the item's async mutex, so ledger
/// entries are observable in the same order as the mutations that produced
/// them. Unrelated items proceed concurrently.
#[derive(Clone)]
pub struct WarehouseService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    deletion: DeletionPolicy,
    ledger: TransactionLedger,
    item_locks: Arc<DashMap<(WarehouseType, Uuid), Arc<Mutex<()>>>>,
}

impl WarehouseService {
    /// Explicit dependency injection; the service never probes its
    /// collaborators at runtime.
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            event_sender,
            deletion: DeletionPolicy::default(),
            ledger: TransactionLedger,
            item_locks: Arc::new(DashMap::new()),
        }
    }

    fn item_lock(&self, warehouse: WarehouseType, id: Uuid) -> Arc<Mutex<()>> {
        self.item_locks
            .entry((warehouse, id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Creates the stock row and its `Purchase` ledger entry as one unit of
    /// work. No lock is needed: the id is fresh.
    #[instrument(skip(self, command), fields(warehouse = %command.warehouse))]
    pub async fn register_purchase(
        &self,
        command: RegisterPurchaseCommand,
    ) -> Result<RegisterPurchaseResult, ServiceError> {
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    /// Applies a partial edit; a no-op edit produces no ledger entry.
    #[instrument(skip(self, command), fields(warehouse = %command.warehouse, item_id = %command.item_id))]
    pub async fn apply_edit(
        &self,
        command: ApplyEditCommand,
    ) -> Result<ApplyEditResult, ServiceError> {
        let lock = self.item_lock(command.warehouse, command.item_id);
        let _guard = lock.lock().await;
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command), fields(warehouse = %command.warehouse, item_id = %command.item_id))]
    pub async fn soft_delete(
        &self,
        command: SoftDeleteStockCommand,
    ) -> Result<SoftDeleteStockResult, ServiceError> {
        let lock = self.item_lock(command.warehouse, command.item_id);
        let _guard = lock.lock().await;
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command), fields(warehouse = %command.warehouse, item_id = %command.item_id))]
    pub async fn restore(
        &self,
        command: RestoreStockCommand,
    ) -> Result<RestoreStockResult, ServiceError> {
        let lock = self.item_lock(command.warehouse, command.item_id);
        let _guard = lock.lock().await;
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    /// First phase of a hard delete: the snapshot to show a human before
    /// committing. Read-only.
    pub async fn hard_delete_preview(
        &self,
        warehouse: WarehouseType,
        item_id: Uuid,
    ) -> Result<stock_item::Model, ServiceError> {
        self.deletion
            .preview_delete(self.db.as_ref(), warehouse, item_id)
            .await
    }

    /// Confirm phase of the hard delete. The lock entry is dropped afterwards
    /// so the map stays bounded by the set of live items.
    #[instrument(skip(self, command), fields(warehouse = %command.warehouse, item_id = %command.item_id))]
    pub async fn hard_delete_confirm(
        &self,
        command: HardDeleteStockCommand,
    ) -> Result<HardDeleteStockResult, ServiceError> {
        let key = (command.warehouse, command.item_id);
        let lock = self.item_lock(key.0, key.1);
        let guard = lock.lock().await;
        let result = command
            .execute(self.db.clone(), self.event_sender.clone())
            .await;
        drop(guard);
        if result.is_ok() {
            self.item_locks.remove(&key);
        }
        result
    }

    /// Point lookup rendered for the user boundary.
    pub async fn get_item(
        &self,
        warehouse: WarehouseType,
        item_id: Uuid,
    ) -> Result<Option<StockItemView>, ServiceError> {
        let found = crate::services::stock_store::StockStore
            .get(self.db.as_ref(), warehouse, item_id)
            .await?;
        found.map(StockItemView::from_model).transpose()
    }

    /// Full audit history of one item, oldest first; survives hard deletion.
    pub async fn item_history(
        &self,
        warehouse: WarehouseType,
        item_id: Uuid,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        self.ledger
            .list_by_item(self.db.as_ref(), warehouse, item_id)
            .await
    }
}
