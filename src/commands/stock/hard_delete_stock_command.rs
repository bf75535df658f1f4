use crate::{
    commands::Command,
    db::DbPool,
    entities::{stock_item, WarehouseType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::deletion::DeletionPolicy,
};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use sea_orm::{TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref STOCK_HARD_DELETES: IntCounter = IntCounter::new(
        "stock_hard_deletes_total",
        "Total number of hard-deleted stock items"
    )
    .expect("metric can be created");
    static ref STOCK_HARD_DELETE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "stock_hard_delete_failures_total",
            "Total number of failed hard deletes"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Confirm phase of the two-phase hard delete.
///
/// Callers obtain a snapshot through the deletion policy's preview first and
/// show it to a human; this command then appends the compensating `Deletion`
/// entry and removes the row, in that order, as one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HardDeleteStockCommand {
    pub warehouse: WarehouseType,
    pub item_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[validate(length(min = 1, max = 100))]
    pub operator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardDeleteStockResult {
    /// The item as it was at the moment of deletion.
    pub snapshot: stock_item::Model,
    pub ledger_entry_id: i64,
}

#[async_trait::async_trait]
impl Command for HardDeleteStockCommand {
    type Result = HardDeleteStockResult;

    #[instrument(skip(self, db_pool, event_sender), fields(warehouse = %self.warehouse, item_id = %self.item_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            STOCK_HARD_DELETE_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            ServiceError::ValidationError(format!("Invalid input: {e}"))
        })?;

        let warehouse = self.warehouse;
        let item_id = self.item_id;
        let reason = self.reason.clone();
        let operator = self.operator.clone();

        let (snapshot, ledger_entry_id) = db_pool
            .transaction::<_, (stock_item::Model, i64), ServiceError>(move |txn| {
                Box::pin(async move {
                    let policy = DeletionPolicy::default();
                    policy
                        .confirm_delete(txn, warehouse, item_id, &reason, &operator)
                        .await
                })
            })
            .await
            .map_err(|e| {
                error!("Transaction failed for hard delete: {e}");
                match e {
                    TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                    TransactionError::Transaction(service_err) => {
                        STOCK_HARD_DELETE_FAILURES
                            .with_label_values(&[service_err.code()])
                            .inc();
                        service_err
                    }
                }
            })?;

        warn!(
            item_id = %snapshot.id,
            removed_quantity = snapshot.quantity,
            "Stock item irreversibly removed"
        );

        event_sender
            .send(Event::StockHardDeleted {
                warehouse: snapshot.warehouse,
                item_id: snapshot.id,
                removed_quantity: snapshot.quantity,
                compensated_value: snapshot.purchase_value(),
                ledger_entry_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        STOCK_HARD_DELETES.inc();
        Ok(HardDeleteStockResult {
            snapshot,
            ledger_entry_id,
        })
    }
}
