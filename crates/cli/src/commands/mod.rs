//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the database named by `KIOSK_DATABASE_URL` / `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error when the variable is missing or the connection fails.
pub(crate) async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("KIOSK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "KIOSK_DATABASE_URL not set")?;

    let pool = kiosk_web::db::create_pool(&database_url).await?;
    Ok(pool)
}
