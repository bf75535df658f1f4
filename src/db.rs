use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
};
use tracing::{debug, info};

use crate::config::load_config;
use crate::entities::{stock_item, stock_transaction};
use crate::errors::ServiceError;

/// Type alias for a database connection pool.
pub type DbPool = DatabaseConnection;

/// Configuration for the database connection pool.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

/// Establishes a connection pool to the database.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };
    establish_connection_with_config(&config).await
}

/// Establishes a connection pool with custom pool settings.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(true);

    info!(
        max_connections = config.max_connections,
        "Connecting to database"
    );

    let pool = Database::connect(opt).await?;
    Ok(pool)
}

/// Creates a pool from the process environment (`APP__DATABASE_URL`).
pub async fn create_db_pool() -> Result<DbPool, ServiceError> {
    let app_config =
        load_config().map_err(|e| ServiceError::InternalError(format!("config error: {e}")))?;
    establish_connection(&app_config.database_url).await
}

/// Creates the two core tables if they do not exist.
///
/// The schema is derived from the entities themselves so tests against
/// `sqlite::memory:` and embedding applications bootstrap identically.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut stock_items = schema.create_table_from_entity(stock_item::Entity);
    stock_items.if_not_exists();
    db.execute(backend.build(&stock_items)).await?;

    let mut stock_transactions = schema.create_table_from_entity(stock_transaction::Entity);
    stock_transactions.if_not_exists();
    db.execute(backend.build(&stock_transactions)).await?;

    info!("Schema bootstrap complete");
    Ok(())
}
