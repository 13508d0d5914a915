//! Database migration command.
//!
//! Runs the SQL migrations from `crates/web/migrations/` and then lets the
//! tower-sessions store create its own table.

use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

/// Run all database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    info!("Preparing session store...");
    PostgresStore::new(pool.clone()).migrate().await?;

    info!("Migrations complete!");
    Ok(())
}
