//! User and profile models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kiosk_core::UserId;

/// A registered user.
///
/// The password hash is deliberately not part of this struct; it only ever
/// travels through `UserRepository::get_password_hash`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-user profile attributes, one-to-one with `User`.
///
/// Profile rows are created lazily: reading a profile that does not exist
/// yet creates an empty one (get-or-create).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: UserId,
    pub bio: String,
    pub avatar_path: Option<String>,
}
