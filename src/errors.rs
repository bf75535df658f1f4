use sea_orm::error::DbErr;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::stock_item::WarehouseType;

/// Error taxonomy for the ledger core.
///
/// Every fallible operation returns one of these as a discrete value; nothing
/// in the crate uses panics or exceptions for control flow. The facade layer
/// propagates errors unchanged to its caller.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    /// Caller supplied a negative quantity. Rejected before any write.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Caller supplied a negative price. Rejected before any write.
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Stock item {id} not found in {warehouse}")]
    ItemNotFound { warehouse: WarehouseType, id: Uuid },

    /// The loose date parser could not make sense of the input at all.
    #[error("Unparseable date: {0}")]
    UnparseableDate(String),

    /// The year component falls outside both calendar bands; the caller must
    /// decide, the parser never guesses.
    #[error("Ambiguous date year: {0} is below the Jalali band [1300, 1500]")]
    AmbiguousDateYear(i32),

    /// The append to the transaction table did not durably succeed. Fatal to
    /// the enclosing unit of work.
    #[error("Ledger write failed: {0}")]
    LedgerWriteFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Stable machine-readable code, used in logs and event payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidQuantity(_) => "invalid_quantity",
            ServiceError::InvalidPrice(_) => "invalid_price",
            ServiceError::ItemNotFound { .. } => "item_not_found",
            ServiceError::UnparseableDate(_) => "unparseable_date",
            ServiceError::AmbiguousDateYear(_) => "ambiguous_date_year",
            ServiceError::LedgerWriteFailed(_) => "ledger_write_failed",
            ServiceError::ValidationError(_) => "validation_error",
            ServiceError::InvalidOperation(_) => "invalid_operation",
            ServiceError::EventError(_) => "event_error",
            ServiceError::DatabaseError(_) => "database_error",
            ServiceError::InternalError(_) => "internal_error",
            ServiceError::Other(_) => "other",
        }
    }
}
