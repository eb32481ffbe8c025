use std::str::FromStr;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::Error;
use crate::config::DbConfig;

static MIGRATOR: Migrator = sqlx::migrate!();

/// Database connection pool.
pub type Database = SqlitePool;

/// Opens the SQLite database named by the configured url, creating the file if it is missing.
///
/// # Errors
///
/// If the database cannot be opened, `Err(Error::OpenDatabase)` is returned.
pub async fn connect(config: &DbConfig) -> Result<Database, Error> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(Error::OpenDatabase)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .idle_timeout(config.idle_timeout)
        .connect_with(options)
        .await
        .map_err(Error::OpenDatabase)?;

    Ok(pool)
}

/// Applies migrations to the database.
///
/// # Errors
///
/// If an error occurs during migration, `Error::DatabaseMigration` is returned.
pub async fn migrate(pool: &Database) -> Result<(), Error> {
    MIGRATOR.run(pool).await.map_err(Error::DatabaseMigration)
}
