pub mod stock_item;
pub mod stock_transaction;

pub use stock_item::{StockStatus, WarehouseType};
pub use stock_transaction::TransactionType;
