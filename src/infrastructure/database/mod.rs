//! Database wiring: connection pool + migrations (C2, C9/C11).

pub mod entities;
pub mod migrator;
pub mod repository;

pub use repository::SeaOrmRepositories;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::PoolConfig;
use migrator::Migrator;
use sea_orm_migration::MigratorTrait;

/// Open the connection pool sized per `pool`, and bring the schema up to
/// date via the embedded migrations (§4.11).
pub async fn init_database(database_url: &str, pool: &PoolConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(pool.max_connections + pool.max_overflow)
        .min_connections(1)
        .connect_timeout(pool.connect_timeout)
        .idle_timeout(pool.idle_recycle);

    info!(database_url, "connecting to database");
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    info!("database migrations applied");

    Ok(db)
}
