use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four independent stock categories of the repair shop.
///
/// Items never move between warehouse types; an item's type is fixed at
/// creation and the `(warehouse, id)` pair is the canonical key everywhere.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[strum(serialize_all = "snake_case")]
pub enum WarehouseType {
    #[sea_orm(string_value = "new_parts")]
    NewParts,
    #[sea_orm(string_value = "used_parts")]
    UsedParts,
    #[sea_orm(string_value = "new_appliances")]
    NewAppliances,
    #[sea_orm(string_value = "used_appliances")]
    UsedAppliances,
}

/// Stock item lifecycle status. Soft deletion transitions this field and
/// nothing else; quantity and prices survive a soft delete untouched.
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
pub enum StockStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "unavailable")]
    Unavailable,
    #[sea_orm(string_value = "reserved")]
    Reserved,
    #[sea_orm(string_value = "sold")]
    Sold,
    #[sea_orm(string_value = "scrapped")]
    Scrapped,
}

impl StockStatus {
    /// Statuses a soft delete may transition an item into.
    pub fn is_soft_delete_target(&self) -> bool {
        matches!(self, StockStatus::Unavailable | StockStatus::Scrapped)
    }
}

/// One physical lot/unit in a given warehouse type.
///
/// `purchase_date` is stored in the Gregorian calendar; the Jalali rendering
/// exists only at the user boundary (see `calendar`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub warehouse: WarehouseType,
    /// Never negative after a committed operation.
    pub quantity: i32,
    pub unit_purchase_price: Decimal,
    pub unit_sale_price: Decimal,
    pub status: StockStatus,
    pub purchase_date: NaiveDate,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active.created_at {
                active.created_at = Set(now);
            }
        }
        active.updated_at = Set(now);
        Ok(active)
    }
}

impl Model {
    /// Purchase-side valuation of the whole lot, used when a hard delete has
    /// to compensate for the removed quantity.
    pub fn purchase_value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_purchase_price
    }
}
