//! User model - organization-scoped accounts carrying the role code the
//! evaluator reads.

use access_core::{Role, Subject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// User state codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserState {
    Active,
    Suspended,
    Deactivated,
}

impl UserState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserState::Active => "active",
            UserState::Suspended => "suspended",
            UserState::Deactivated => "deactivated",
        }
    }
}

/// User entity (organization-scoped).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    /// Stored role code. Parsed leniently: an unrecognized code means the
    /// user currently has no role and every access check denies.
    pub role_code: String,
    pub business_unit_id: Option<Uuid>,
    pub user_state_code: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl User {
    /// Create a new user.
    pub fn new(organization_id: Uuid, email: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            organization_id,
            email,
            display_name,
            role_code: Role::TeamMember.as_str().to_string(),
            business_unit_id: None,
            user_state_code: UserState::Active.as_str().to_string(),
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Check if user is active.
    pub fn is_active(&self) -> bool {
        self.user_state_code == UserState::Active.as_str()
    }

    /// The parsed role, if the stored code is recognized.
    pub fn role(&self) -> Option<Role> {
        self.role_code.parse().ok()
    }

    /// The evaluator's view of this user.
    pub fn subject(&self) -> Subject {
        Subject::new(self.user_id, self.role(), self.business_unit_id)
    }
}

/// User response for API (no internal state codes beyond what the UI needs).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role_code: String,
    pub business_unit_id: Option<Uuid>,
    pub user_state_code: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            organization_id: u.organization_id,
            email: u.email,
            display_name: u.display_name,
            role_code: u.role_code,
            business_unit_id: u.business_unit_id,
            user_state_code: u.user_state_code,
            created_utc: u.created_utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults_to_team_member() {
        let user = User::new(Uuid::new_v4(), "a@example.com".to_string(), None);
        assert_eq!(user.role(), Some(Role::TeamMember));
        assert!(user.is_active());
    }

    #[test]
    fn test_unknown_role_code_parses_to_none() {
        let mut user = User::new(Uuid::new_v4(), "a@example.com".to_string(), None);
        user.role_code = "owner".to_string();
        assert_eq!(user.role(), None);
        assert_eq!(user.subject().role, None);
    }

    #[test]
    fn test_legacy_super_admin_code_is_admin() {
        let mut user = User::new(Uuid::new_v4(), "a@example.com".to_string(), None);
        user.role_code = "super_admin".to_string();
        assert_eq!(user.role(), Some(Role::Admin));
    }
}
