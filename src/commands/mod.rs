use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern.
///
/// Each mutating warehouse operation is a command: a validated input object
/// that executes as one database transaction and publishes its domain event
/// only after the unit of work committed.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully.
    type Result;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod stock;
