use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::stock_item::{self, Entity as StockItem, StockStatus, WarehouseType};
use crate::errors::ServiceError;

/// Input for registering a new stock item. The purchase date is already
/// Gregorian here; the Jalali string boundary is crossed in the command layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockItem {
    pub warehouse: WarehouseType,
    pub quantity: i32,
    pub unit_purchase_price: Decimal,
    pub unit_sale_price: Decimal,
    pub purchase_date: NaiveDate,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Partial update for a stock item; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockItemPatch {
    pub quantity: Option<i32>,
    pub unit_purchase_price: Option<Decimal>,
    pub unit_sale_price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl StockItemPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.unit_purchase_price.is_none()
            && self.unit_sale_price.is_none()
            && self.purchase_date.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }
}

fn check_quantity(quantity: i32) -> Result<(), ServiceError> {
    if quantity < 0 {
        return Err(ServiceError::InvalidQuantity(format!(
            "quantity must be >= 0, got {quantity}"
        )));
    }
    Ok(())
}

fn check_price(label: &str, price: Decimal) -> Result<(), ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::InvalidPrice(format!(
            "{label} must be >= 0, got {price}"
        )));
    }
    Ok(())
}

/// Owner of the canonical stock rows for all four warehouse types.
///
/// Stateless: every method takes a connection so calls compose inside one
/// `db.transaction` unit of work together with the ledger append.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockStore;

impl StockStore {
    /// Inserts a new row with a fresh id and `Available` status.
    #[instrument(skip(self, conn, item), fields(warehouse = %item.warehouse))]
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        item: NewStockItem,
    ) -> Result<stock_item::Model, ServiceError> {
        check_quantity(item.quantity)?;
        check_price("unit purchase price", item.unit_purchase_price)?;
        check_price("unit sale price", item.unit_sale_price)?;

        let active = stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            warehouse: Set(item.warehouse),
            quantity: Set(item.quantity),
            unit_purchase_price: Set(item.unit_purchase_price),
            unit_sale_price: Set(item.unit_sale_price),
            status: Set(StockStatus::Available),
            purchase_date: Set(item.purchase_date),
            location: Set(item.location),
            description: Set(item.description),
            ..Default::default()
        };

        let model = active.insert(conn).await?;
        Ok(model)
    }

    /// Point lookup by `(warehouse, id)`.
    pub async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
    ) -> Result<Option<stock_item::Model>, ServiceError> {
        let found = StockItem::find()
            .filter(stock_item::Column::Warehouse.eq(warehouse))
            .filter(stock_item::Column::Id.eq(id))
            .one(conn)
            .await?;
        Ok(found)
    }

    /// Like [`StockStore::get`] but missing rows are an error.
    pub async fn get_required<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
    ) -> Result<stock_item::Model, ServiceError> {
        self.get(conn, warehouse, id)
            .await?
            .ok_or(ServiceError::ItemNotFound { warehouse, id })
    }

    /// Partial update. Every field in the patch is validated before any write
    /// so a rejected patch leaves the row untouched.
    #[instrument(skip(self, conn, patch))]
    pub async fn update_fields<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
        patch: StockItemPatch,
    ) -> Result<stock_item::Model, ServiceError> {
        if let Some(quantity) = patch.quantity {
            check_quantity(quantity)?;
        }
        if let Some(price) = patch.unit_purchase_price {
            check_price("unit purchase price", price)?;
        }
        if let Some(price) = patch.unit_sale_price {
            check_price("unit sale price", price)?;
        }

        let current = self.get_required(conn, warehouse, id).await?;
        let mut active: stock_item::ActiveModel = current.into();

        if let Some(quantity) = patch.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(price) = patch.unit_purchase_price {
            active.unit_purchase_price = Set(price);
        }
        if let Some(price) = patch.unit_sale_price {
            active.unit_sale_price = Set(price);
        }
        if let Some(date) = patch.purchase_date {
            active.purchase_date = Set(date);
        }
        if let Some(location) = patch.location {
            active.location = Set(Some(location));
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }

        let model = active.update(conn).await?;
        Ok(model)
    }

    /// The only mutation path for `status`; callers outside the deletion
    /// policy have no business here.
    #[instrument(skip(self, conn))]
    pub async fn set_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
        new_status: StockStatus,
    ) -> Result<stock_item::Model, ServiceError> {
        let current = self.get_required(conn, warehouse, id).await?;
        let mut active: stock_item::ActiveModel = current.into();
        active.status = Set(new_status);
        let model = active.update(conn).await?;
        Ok(model)
    }

    /// Unconditional row deletion. Idempotent: removing an already-removed
    /// row is a no-op success, which is what makes the hard-delete retry
    /// path safe.
    #[instrument(skip(self, conn))]
    pub async fn remove<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse: WarehouseType,
        id: Uuid,
    ) -> Result<(), ServiceError> {
        StockItem::delete_many()
            .filter(stock_item::Column::Warehouse.eq(warehouse))
            .filter(stock_item::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }
}
