//! Staff user creation command.

use tracing::info;

use kiosk_web::services::auth::AuthService;

/// Create a staff user.
///
/// # Errors
///
/// Returns an error on invalid input, a taken username, or database
/// failure.
pub async fn create(username: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let user = AuthService::new(&pool)
        .register_staff(username, password)
        .await?;

    info!(user_id = %user.id, username = %user.username, "staff user created");
    Ok(())
}
