use crate::{
    commands::Command,
    db::DbPool,
    entities::{stock_item, StockStatus, WarehouseType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::deletion::DeletionPolicy,
};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref STOCK_SOFT_DELETES: IntCounter = IntCounter::new(
        "stock_soft_deletes_total",
        "Total number of soft-deleted stock items"
    )
    .expect("metric can be created");
}

/// Hides a stock item without consuming it: one zero-delta `SoftDeletion`
/// ledger entry carrying the reason, then the status transition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SoftDeleteStockCommand {
    pub warehouse: WarehouseType,
    pub item_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    /// `Unavailable` or `Scrapped`; any other target is rejected.
    pub target_status: StockStatus,
    #[validate(length(min = 1, max = 100))]
    pub operator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftDeleteStockResult {
    pub item: stock_item::Model,
    pub ledger_entry_id: i64,
}

#[async_trait::async_trait]
impl Command for SoftDeleteStockCommand {
    type Result = SoftDeleteStockResult;

    #[instrument(skip(self, db_pool, event_sender), fields(warehouse = %self.warehouse, item_id = %self.item_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {e}")))?;

        let warehouse = self.warehouse;
        let item_id = self.item_id;
        let reason = self.reason.clone();
        let target_status = self.target_status;
        let operator = self.operator.clone();

        let (item, ledger_entry_id) = db_pool
            .transaction::<_, (stock_item::Model, i64), ServiceError>(move |txn| {
                Box::pin(async move {
                    let policy = DeletionPolicy::default();
                    policy
                        .soft_delete(txn, warehouse, item_id, &reason, target_status, &operator)
                        .await
                })
            })
            .await
            .map_err(|e| {
                error!("Transaction failed for soft delete: {e}");
                match e {
                    TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        event_sender
            .send(Event::StockSoftDeleted {
                warehouse: item.warehouse,
                item_id: item.id,
                new_status: item.status,
                ledger_entry_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        STOCK_SOFT_DELETES.inc();
        Ok(SoftDeleteStockResult {
            item,
            ledger_entry_id,
        })
    }
}
