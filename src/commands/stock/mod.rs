pub mod apply_edit_command;
pub mod hard_delete_stock_command;
pub mod register_purchase_command;
pub mod restore_stock_command;
pub mod soft_delete_stock_command;

pub use apply_edit_command::{ApplyEditCommand, ApplyEditResult};
pub use hard_delete_stock_command::{HardDeleteStockCommand, HardDeleteStockResult};
pub use register_purchase_command::{RegisterPurchaseCommand, RegisterPurchaseResult};
pub use restore_stock_command::{RestoreStockCommand, RestoreStockResult};
pub use soft_delete_stock_command::{SoftDeleteStockCommand, SoftDeleteStockResult};
