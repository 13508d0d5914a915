//! Session data models.

use serde::{Deserialize, Serialize};

use kiosk_core::UserId;

/// Session storage keys.
pub mod session_keys {
    /// Key under which the logged-in user is stored.
    pub const CURRENT_USER: &str = "current_user";
}

/// The logged-in user as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub is_staff: bool,
}

impl CurrentUser {
    /// Whether this user may view resources owned by `owner`.
    ///
    /// Staff may view anything; other users only their own resources.
    #[must_use]
    pub fn can_view_owned_by(&self, owner: Option<UserId>) -> bool {
        self.is_staff || owner == Some(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32, is_staff: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            username: "someone".to_string(),
            is_staff,
        }
    }

    #[test]
    fn test_staff_views_everything() {
        assert!(user(1, true).can_view_owned_by(Some(UserId::new(2))));
        assert!(user(1, true).can_view_owned_by(None));
    }

    #[test]
    fn test_owner_views_own() {
        assert!(user(1, false).can_view_owned_by(Some(UserId::new(1))));
    }

    #[test]
    fn test_non_owner_denied() {
        assert!(!user(1, false).can_view_owned_by(Some(UserId::new(2))));
        assert!(!user(1, false).can_view_owned_by(None));
    }
}
