use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{StockStatus, WarehouseType};

/// Domain events emitted after a unit of work commits.
///
/// Fan-out (queues, webhooks, UI refresh) is the embedding application's
/// concern; the core only guarantees that an event is sent once the matching
/// stock mutation and ledger entry are durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PurchaseRegistered {
        warehouse: WarehouseType,
        item_id: Uuid,
        quantity: i32,
        unit_purchase_price: Decimal,
        ledger_entry_id: i64,
    },
    InventoryEdited {
        warehouse: WarehouseType,
        item_id: Uuid,
        quantity_delta: i32,
        new_quantity: i32,
        ledger_entry_id: i64,
    },
    PriceChanged {
        warehouse: WarehouseType,
        item_id: Uuid,
        unit_purchase_price: Decimal,
        unit_sale_price: Decimal,
        ledger_entry_id: i64,
    },
    StockSoftDeleted {
        warehouse: WarehouseType,
        item_id: Uuid,
        new_status: StockStatus,
        ledger_entry_id: i64,
    },
    StockRestored {
        warehouse: WarehouseType,
        item_id: Uuid,
        ledger_entry_id: i64,
    },
    StockHardDeleted {
        warehouse: WarehouseType,
        item_id: Uuid,
        removed_quantity: i32,
        compensated_value: Decimal,
        ledger_entry_id: i64,
    },
}

/// Thin wrapper over an mpsc sender so services depend on one injectable
/// handle instead of a raw channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        if let Ok(payload) = serde_json::to_string(&event) {
            debug!(payload = %payload, "Dispatching event");
        }
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_payloads_carry_the_variant_tag() {
        let event = Event::StockHardDeleted {
            warehouse: WarehouseType::NewParts,
            item_id: Uuid::nil(),
            removed_quantity: 7,
            compensated_value: dec!(350000),
            ledger_entry_id: 42,
        };
        let payload = serde_json::to_value(&event).expect("events are serializable");
        assert!(payload.get("StockHardDeleted").is_some());
        assert_eq!(payload["StockHardDeleted"]["removed_quantity"], 7);
    }
}
