use crate::{
    calendar,
    commands::Command,
    db::DbPool,
    entities::{stock_item, stock_transaction, TransactionType, WarehouseType},
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::{reconcile_edit, NewLedgerEntry, TransactionLedger},
    services::stock_store::{StockItemPatch, StockStore},
};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use rust_decimal::Decimal;
use sea_orm::{TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref STOCK_EDITS: IntCounter = IntCounter::new(
        "stock_edits_applied_total",
        "Total number of applied stock edits"
    )
    .expect("metric can be created");
    static ref STOCK_EDIT_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "stock_edit_failures_total",
            "Total number of failed stock edits"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Partial edit of a stock item's quantity, prices, or metadata.
///
/// The edit is reconciled against the prior snapshot: a quantity change
/// produces one `InventoryEdit` entry, a price-only change one zero-delta
/// `PriceChange` entry, and a no-op or metadata-only edit produces no ledger
/// entry at all.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyEditCommand {
    pub warehouse: WarehouseType,
    pub item_id: Uuid,
    pub quantity: Option<i32>,
    pub unit_purchase_price: Option<Decimal>,
    pub unit_sale_price: Option<Decimal>,
    /// User-facing date string (Jalali or Gregorian per the loose-parse
    /// heuristic).
    #[validate(length(min = 1, max = 20))]
    pub purchase_date: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub operator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyEditResult {
    pub item: stock_item::Model,
    /// Absent when the edit changed neither quantity nor price.
    pub ledger_entry: Option<stock_transaction::Model>,
}

#[async_trait::async_trait]
impl Command for ApplyEditCommand {
    type Result = ApplyEditResult;

    #[instrument(skip(self, db_pool, event_sender), fields(warehouse = %self.warehouse, item_id = %self.item_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            STOCK_EDIT_FAILURES.with_label_values(&["validation_error"]).inc();
            ServiceError::ValidationError(format!("Invalid input: {e}"))
        })?;

        // An explicitly supplied date must parse; there is no silent fallback
        // on the edit path.
        let purchase_date = match &self.purchase_date {
            Some(text) => Some(
                calendar::parse_loose_date(text)
                    .map_err(|e| {
                        STOCK_EDIT_FAILURES.with_label_values(&[e.code()]).inc();
                        e
                    })?
                    .date,
            ),
            None => None,
        };

        let patch = StockItemPatch {
            quantity: self.quantity,
            unit_purchase_price: self.unit_purchase_price,
            unit_sale_price: self.unit_sale_price,
            purchase_date,
            location: self.location.clone(),
            description: self.description.clone(),
        };

        let warehouse = self.warehouse;
        let item_id = self.item_id;
        let operator = self.operator.clone();

        let (item, ledger_entry) = db_pool
            .transaction::<_, (stock_item::Model, Option<stock_transaction::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let store = StockStore;
                        let ledger = TransactionLedger;

                        let before = store.get_required(txn, warehouse, item_id).await?;
                        if patch.is_empty() {
                            return Ok((before, None));
                        }

                        let after = store.update_fields(txn, warehouse, item_id, patch).await?;

                        let entry = match reconcile_edit(&before, &after) {
                            Some(outcome) => {
                                let description = match outcome.transaction_type {
                                    TransactionType::InventoryEdit => format!(
                                        "quantity {} -> {}",
                                        before.quantity, after.quantity
                                    ),
                                    _ => format!(
                                        "unit prices {}/{} -> {}/{}",
                                        before.unit_purchase_price,
                                        before.unit_sale_price,
                                        after.unit_purchase_price,
                                        after.unit_sale_price
                                    ),
                                };
                                Some(
                                    ledger
                                        .record(
                                            txn,
                                            NewLedgerEntry {
                                                warehouse,
                                                item_id,
                                                transaction_type: outcome.transaction_type,
                                                quantity_delta: outcome.quantity_delta,
                                                unit_price: outcome.unit_price,
                                                description,
                                                operator,
                                            },
                                        )
                                        .await?,
                                )
                            }
                            None => None,
                        };

                        Ok((after, entry))
                    })
                },
            )
            .await
            .map_err(|e| {
                error!("Transaction failed for stock edit: {e}");
                match e {
                    TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        if let Some(entry) = &ledger_entry {
            let event = match entry.transaction_type {
                TransactionType::InventoryEdit => Event::InventoryEdited {
                    warehouse: item.warehouse,
                    item_id: item.id,
                    quantity_delta: entry.quantity_delta,
                    new_quantity: item.quantity,
                    ledger_entry_id: entry.id,
                },
                _ => Event::PriceChanged {
                    warehouse: item.warehouse,
                    item_id: item.id,
                    unit_purchase_price: item.unit_purchase_price,
                    unit_sale_price: item.unit_sale_price,
                    ledger_entry_id: entry.id,
                },
            };
            event_sender.send(event).await.map_err(ServiceError::EventError)?;
        }

        STOCK_EDITS.inc();
        info!(
            ledger_entry = ledger_entry.as_ref().map(|e| e.id),
            "Stock edit applied"
        );
        Ok(ApplyEditResult { item, ledger_entry })
    }
}
