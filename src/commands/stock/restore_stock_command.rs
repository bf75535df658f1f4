use crate::{
    commands::Command,
    db::DbPool,
    entities::{stock_item, WarehouseType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::deletion::DeletionPolicy,
};
use sea_orm::{TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;
use validator::Validate;

/// Reverses a soft delete: the item returns to `Available` with quantity and
/// prices untouched, leaving one zero-delta `Restoration` entry behind.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RestoreStockCommand {
    pub warehouse: WarehouseType,
    pub item_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub operator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreStockResult {
    pub item: stock_item::Model,
    pub ledger_entry_id: i64,
}

#[async_trait::async_trait]
impl Command for RestoreStockCommand {
    type Result = RestoreStockResult;

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
        let operator = self.operator.clone();

        let (item, ledger_entry_id) = db_pool
            .transaction::<_, (stock_item::Model, i64), ServiceError>(move |txn| {
                Box::pin(async move {
                    let policy = DeletionPolicy::default();
                    policy.restore(txn, warehouse, item_id, &operator).await
                })
            })
            .await
            .map_err(|e| {
                error!("Transaction failed for restore: {e}");
                match e {
                    TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        event_sender
            .send(Event::StockRestored {
                warehouse: item.warehouse,
                item_id: item.id,
                ledger_entry_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(RestoreStockResult {
            item,
            ledger_entry_id,
        })
    }
}
