use crate::{
    calendar,
    commands::Command,
    db::DbPool,
    entities::{stock_item, stock_transaction, TransactionType, WarehouseType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::{NewLedgerEntry, TransactionLedger},
    services::stock_store::{NewStockItem, StockStore},
};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use rust_decimal::Decimal;
use sea_orm::{TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

lazy_static! {
    static ref PURCHASES_REGISTERED: IntCounter = IntCounter::new(
        "stock_purchases_registered_total",
        "Total number of registered stock purchases"
    )
    .expect("metric can be created");
    static ref PURCHASE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "stock_purchase_failures_total",
            "Total number of failed purchase registrations"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Registers a newly purchased lot in one warehouse type.
///
/// The purchase date is a mandatory user-facing date string (Jalali, or
/// Gregorian per the loose-parse heuristic); an unparseable or ambiguous date
/// rejects the whole command.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterPurchaseCommand {
    pub warehouse: WarehouseType,
    pub quantity: i32,
    pub unit_purchase_price: Decimal,
    pub unit_sale_price: Decimal,
    #[validate(length(min = 1, max = 20))]
    pub purchase_date: String,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub operator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPurchaseResult {
    pub item: stock_item::Model,
    pub ledger_entry: stock_transaction::Model,
}

#[async_trait::async_trait]
impl Command for RegisterPurchaseCommand {
    type Result = RegisterPurchaseResult;

    #[instrument(skip(self, db_pool, event_sender), fields(warehouse = %self.warehouse))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            PURCHASE_FAILURES.with_label_values(&["validation_error"]).inc();
            ServiceError::ValidationError(format!("Invalid input: {e}"))
        })?;

        // Mandatory date: never fall back to "today" here.
        let purchase_date = calendar::parse_loose_date(&self.purchase_date)
            .map_err(|e| {
                PURCHASE_FAILURES.with_label_values(&[e.code()]).inc();
                e
            })?
            .date;

        let new_item = NewStockItem {
            warehouse: self.warehouse,
            quantity: self.quantity,
            unit_purchase_price: self.unit_purchase_price,
            unit_sale_price: self.unit_sale_price,
            purchase_date,
            location: self.location.clone(),
            description: self.description.clone(),
        };
        let operator = self.operator.clone();
        let warehouse = self.warehouse;

        let (item, ledger_entry) = db_pool
            .transaction::<_, (stock_item::Model, stock_transaction::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let store = StockStore;
                        let ledger = TransactionLedger;

                        let item = store.create(txn, new_item).await?;
                        let entry = ledger
                            .record(
                                txn,
                                NewLedgerEntry {
                                    warehouse,
                                    item_id: item.id,
                                    transaction_type: TransactionType::Purchase,
                                    quantity_delta: item.quantity,
                                    unit_price: item.unit_purchase_price,
                                    description: format!(
                                        "purchase registered: {} units",
                                        item.quantity
                                    ),
                                    operator,
                                },
                            )
                            .await?;
                        Ok((item, entry))
                    })
                },
            )
            .await
            .map_err(|e| {
                error!("Transaction failed for purchase registration: {e}");
                match e {
                    TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        event_sender
            .send(Event::PurchaseRegistered {
                warehouse: item.warehouse,
                item_id: item.id,
                quantity: item.quantity,
                unit_purchase_price: item.unit_purchase_price,
                ledger_entry_id: ledger_entry.id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        PURCHASES_REGISTERED.inc();
        info!(
            item_id = %item.id,
            quantity = item.quantity,
            "Purchase registered"
        );
        Ok(RegisterPurchaseResult { item, ledger_entry })
    }
}
