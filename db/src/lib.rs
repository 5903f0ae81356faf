use std::str::FromStr;

use color_eyre::{eyre::Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod cooking;
pub mod favorites;
pub mod users;

pub use sqlx;
pub use sqlx::SqlitePool;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://forked.db?mode=rwc";

#[tracing::instrument(err)]
pub async fn setup_db_pool() -> Result<SqlitePool> {
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    connect(&database_url).await
}

/// True when `err` came from a UNIQUE (or primary key) constraint failing.
pub fn is_unique_violation(err: &color_eyre::Report) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Opens a pool for `database_url` and brings the schema up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .wrap_err_with(|| format!("Invalid DATABASE_URL {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to an in-memory database gets its own database
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        5
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .wrap_err("Failed to open database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .wrap_err("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    Ok(pool)
}
