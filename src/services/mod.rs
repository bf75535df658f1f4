pub mod deletion;
pub mod ledger;
pub mod stock_store;
pub mod warehouse;

pub use deletion::DeletionPolicy;
pub use ledger::TransactionLedger;
pub use stock_store::StockStore;
pub use warehouse::WarehouseService;
