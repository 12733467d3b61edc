//! Organization model - the tenant boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Organization state codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationState {
    Active,
    Suspended,
}

impl OrganizationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationState::Active => "active",
            OrganizationState::Suspended => "suspended",
        }
    }
}

/// Organization entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub organization_id: Uuid,
    pub org_slug: String,
    pub org_label: String,
    pub org_state_code: String,
    pub created_utc: DateTime<Utc>,
}

impl Organization {
    /// Create a new organization.
    pub fn new(org_slug: String, org_label: String) -> Self {
        Self {
            organization_id: Uuid::new_v4(),
            org_slug,
            org_label,
            org_state_code: OrganizationState::Active.as_str().to_string(),
            created_utc: Utc::now(),
        }
    }

    /// Check if the organization is active.
    pub fn is_active(&self) -> bool {
        self.org_state_code == OrganizationState::Active.as_str()
    }
}
