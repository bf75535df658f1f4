use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar;
use crate::entities::{TransactionType, WarehouseType};
use crate::errors::ServiceError;
use crate::lookup::CachedItemLookup;
use crate::services::ledger::{LedgerFilter, TransactionLedger};

/// Report-facing filter. Date bounds are user-typed loose date strings
/// (Jalali or Gregorian per the parse heuristic) and inclusive on both ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionReportFilter {
    pub warehouse: Option<WarehouseType>,
    pub transaction_type: Option<TransactionType>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// One report row; the timestamp is rendered in the Jalali calendar for the
/// user boundary, and the raw instant is kept for sorting/export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: i64,
    pub warehouse: WarehouseType,
    pub item_id: Uuid,
    /// Resolved through the lookup collaborator when one is supplied;
    /// reports render the raw id otherwise.
    pub item_name: Option<String>,
    pub transaction_type: TransactionType,
    pub quantity_delta: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub description: String,
    pub operator: String,
    pub recorded_at: DateTime<Utc>,
    pub recorded_on_jalali: String,
}

fn parse_bound(text: &str) -> Result<NaiveDate, ServiceError> {
    Ok(calendar::parse_loose_date(text)?.date)
}

/// Filtered, ordered transaction listing for the report forms.
///
/// Purely a read path: additive filters, no side effects, and the lookup
/// cache (when provided) only decorates rows with display names.
pub async fn list_transactions(
    db: &DatabaseConnection,
    filter: TransactionReportFilter,
    lookup: Option<&CachedItemLookup>,
) -> Result<Vec<TransactionView>, ServiceError> {
    let recorded_from = filter
        .date_from
        .as_deref()
        .map(parse_bound)
        .transpose()?
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());

    // Inclusive upper bound: strictly before the following midnight.
    let recorded_to = filter
        .date_to
        .as_deref()
        .map(parse_bound)
        .transpose()?
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());

    let entries = TransactionLedger
        .list_by_filter(
            db,
            LedgerFilter {
                warehouse: filter.warehouse,
                transaction_type: filter.transaction_type,
                recorded_from,
                recorded_to,
            },
        )
        .await?;

    let mut views = Vec::with_capacity(entries.len());
    for entry in entries {
        let item_name = match lookup {
            Some(cache) => cache.get_or_compute(entry.warehouse, entry.item_id).await,
            None => None,
        };
        views.push(TransactionView {
            id: entry.id,
            warehouse: entry.warehouse,
            item_id: entry.item_id,
            item_name,
            transaction_type: entry.transaction_type,
            quantity_delta: entry.quantity_delta,
            unit_price: entry.unit_price,
            total_price: entry.total_price,
            description: entry.description,
            operator: entry.operator,
            recorded_at: entry.created_at,
            recorded_on_jalali: calendar::format_jalali(entry.created_at.date_naive())?,
        });
    }
    Ok(views)
}
