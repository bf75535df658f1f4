use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stock_item::WarehouseType;

/// Classification of ledger entries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionType {
    #[sea_orm(string_value = "purchase")]
    Purchase,
    #[sea_orm(string_value = "inventory_edit")]
    InventoryEdit,
    #[sea_orm(string_value = "price_change")]
    PriceChange,
    #[sea_orm(string_value = "deletion")]
    Deletion,
    #[sea_orm(string_value = "soft_deletion")]
    SoftDeletion,
    #[sea_orm(string_value = "restoration")]
    Restoration,
}

impl TransactionType {
    /// Deletion-class entries must carry the operator-supplied reason in
    /// `description`.
    pub fn requires_reason(&self) -> bool {
        matches!(self, TransactionType::Deletion | TransactionType::SoftDeletion)
    }

    /// Entry types whose quantity delta is zero by definition.
    pub fn is_zero_delta(&self) -> bool {
        matches!(
            self,
            TransactionType::PriceChange
                | TransactionType::SoftDeletion
                | TransactionType::Restoration
        )
    }
}

/// One immutable row of the append-only audit trail.
///
/// The referenced stock item may have been hard-deleted; the entry persists
/// regardless. The running sum of `quantity_delta` over all entries for a
/// `(warehouse, item_id)` equals the item's current quantity while it exists.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub warehouse: WarehouseType,
    pub item_id: Uuid,
    pub transaction_type: TransactionType,
    /// Positive for additions, negative for removals/decrements.
    pub quantity_delta: i32,
    pub unit_price: Decimal,
    /// `|quantity_delta| * unit_price`; zero for zero-delta entry types.
    pub total_price: Decimal,
    pub description: String,
    pub operator: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active = self;
        if let ActiveValue::NotSet = active.created_at {
            active.created_at = Set(Utc::now());
        }
        Ok(active)
    }
}

impl Model {
    /// Signed money value of the entry (negative for removals).
    pub fn signed_value(&self) -> Decimal {
        if self.quantity_delta < 0 {
            -self.total_price
        } else {
            self.total_price
        }
    }
}

/// Expected total for a delta/unit-price pair; the ledger enforces this on
/// every append. `unsigned_abs` keeps this total over the whole `i32` range.
pub fn expected_total(quantity_delta: i32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity_delta.unsigned_abs()) * unit_price
}
