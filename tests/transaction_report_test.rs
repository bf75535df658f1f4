use std::sync::Arc;

use anbar_ledger::{
    commands::stock::{ApplyEditCommand, RegisterPurchaseCommand, SoftDeleteStockCommand},
    db::{establish_connection, run_migrations, DbPool},
    entities::{StockStatus, TransactionType, WarehouseType},
    events::{Event, EventSender},
    lookup::{CachedItemLookup, ItemNameLookup},
    queries::transaction_queries::{list_transactions, TransactionReportFilter},
    services::WarehouseService,
};
use async_trait::async_trait;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use uuid::Uuid;

struct FixedNameLookup;

#[async_trait]
impl ItemNameLookup for FixedNameLookup {
    async fn display_name(&self, warehouse: WarehouseType, _item_id: Uuid) -> Option<String> {
        Some(format!("demo item ({warehouse})"))
    }
}

async fn setup(name: &str) -> (WarehouseService, Arc<DbPool>, mpsc::Receiver<Event>) {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let pool = Arc::new(
        establish_connection(&url)
            .await
            .expect("Failed to create DB pool"),
    );
    run_migrations(pool.as_ref())
        .await
        .expect("Failed to run migrations");
    let (tx, rx) = mpsc::channel(100);
    let service = WarehouseService::new(pool.clone(), Arc::new(EventSender::new(tx)));
    (service, pool, rx)
}

fn purchase(warehouse: WarehouseType, quantity: i32) -> RegisterPurchaseCommand {
    RegisterPurchaseCommand {
        warehouse,
        quantity,
        unit_purchase_price: dec!(50000),
        unit_sale_price: dec!(60000),
        purchase_date: "1402/05/10".to_string(),
        location: None,
        description: None,
        operator: "reporter".to_string(),
    }
}

#[tokio::test]
async fn report_filters_are_additive() {
    let (service, pool, _events) = setup("report_filters").await;

    let parts = service
        .register_purchase(purchase(WarehouseType::NewParts, 10))
        .await
        .unwrap();
    let appliances = service
        .register_purchase(purchase(WarehouseType::NewAppliances, 2))
        .await
        .unwrap();
    service
        .apply_edit(ApplyEditCommand {
            warehouse: WarehouseType::NewParts,
            item_id: parts.item.id,
            quantity: Some(7),
            unit_purchase_price: None,
            unit_sale_price: None,
            purchase_date: None,
            location: None,
            description: None,
            operator: "reporter".to_string(),
        })
        .await
        .unwrap();
    service
        .soft_delete(SoftDeleteStockCommand {
            warehouse: WarehouseType::NewAppliances,
            item_id: appliances.item.id,
            reason: "display model retired".to_string(),
            target_status: StockStatus::Scrapped,
            operator: "reporter".to_string(),
        })
        .await
        .unwrap();

    // No filters: everything, oldest first.
    let all = list_transactions(pool.as_ref(), TransactionReportFilter::default(), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));

    // Warehouse filter.
    let parts_only = list_transactions(
        pool.as_ref(),
        TransactionReportFilter {
            warehouse: Some(WarehouseType::NewParts),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    assert_eq!(parts_only.len(), 2);
    assert!(parts_only
        .iter()
        .all(|v| v.warehouse == WarehouseType::NewParts));

    // Warehouse + type filter.
    let edits_only = list_transactions(
        pool.as_ref(),
        TransactionReportFilter {
            warehouse: Some(WarehouseType::NewParts),
            transaction_type: Some(TransactionType::InventoryEdit),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    assert_eq!(edits_only.len(), 1);
    assert_eq!(edits_only[0].quantity_delta, -3);
}

#[tokio::test]
async fn report_date_range_accepts_jalali_bounds() {
    let (service, pool, _events) = setup("report_dates").await;
    service
        .register_purchase(purchase(WarehouseType::UsedParts, 4))
        .await
        .unwrap();

    // Entries are recorded now, so a Jalali window around today matches and
    // a window in the past does not.
    let today = anbar_ledger::calendar::to_jalali(chrono::Utc::now().date_naive())
        .unwrap()
        .to_string();
    let current_window = list_transactions(
        pool.as_ref(),
        TransactionReportFilter {
            date_from: Some(today.clone()),
            date_to: Some(today),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    assert_eq!(current_window.len(), 1);
    assert_eq!(
        current_window[0].recorded_on_jalali,
        anbar_ledger::calendar::to_jalali(current_window[0].recorded_at.date_naive())
            .unwrap()
            .to_string()
    );

    let stale_window = list_transactions(
        pool.as_ref(),
        TransactionReportFilter {
            date_from: Some("1400/01/01".to_string()),
            date_to: Some("1400/12/29".to_string()),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    assert!(stale_window.is_empty());
}

#[tokio::test]
async fn report_rows_are_decorated_through_the_cache() {
    let (service, pool, _events) = setup("report_names").await;
    service
        .register_purchase(purchase(WarehouseType::NewParts, 1))
        .await
        .unwrap();

    let cache = CachedItemLookup::new(Arc::new(FixedNameLookup), 16);
    let rows = list_transactions(pool.as_ref(), TransactionReportFilter::default(), Some(&cache))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item_name.as_deref(), Some("demo item (new_parts)"));

    let undecorated = list_transactions(pool.as_ref(), TransactionReportFilter::default(), None)
        .await
        .unwrap();
    assert!(undecorated[0].item_name.is_none());
}
