//! Business unit model - the scoping boundary for emissions data.

use access_core::BusinessUnitRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Business unit state codes. Units are archived, never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessUnitState {
    Active,
    Archived,
}

impl BusinessUnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessUnitState::Active => "active",
            BusinessUnitState::Archived => "archived",
        }
    }
}

/// Business unit entity (organization-scoped).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessUnit {
    pub business_unit_id: Uuid,
    pub organization_id: Uuid,
    pub unit_label: String,
    /// Recorded manager. Drives the manager-delegation rule: a manager
    /// reaches any unit that records them here, belonging or not.
    pub manager_id: Option<Uuid>,
    pub unit_state_code: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl BusinessUnit {
    /// Create a new business unit.
    pub fn new(organization_id: Uuid, unit_label: String, manager_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            business_unit_id: Uuid::new_v4(),
            organization_id,
            unit_label,
            manager_id,
            unit_state_code: BusinessUnitState::Active.as_str().to_string(),
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Check if the unit has been archived.
    pub fn is_archived(&self) -> bool {
        self.unit_state_code == BusinessUnitState::Archived.as_str()
    }

    /// The evaluator's view of this unit.
    pub fn directory_ref(&self) -> BusinessUnitRef {
        BusinessUnitRef::new(self.business_unit_id, self.manager_id)
    }
}

/// Business unit response for API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessUnitResponse {
    pub business_unit_id: Uuid,
    pub organization_id: Uuid,
    pub unit_label: String,
    pub manager_id: Option<Uuid>,
    pub unit_state_code: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_utc: DateTime<Utc>,
}

impl From<BusinessUnit> for BusinessUnitResponse {
    fn from(bu: BusinessUnit) -> Self {
        Self {
            business_unit_id: bu.business_unit_id,
            organization_id: bu.organization_id,
            unit_label: bu.unit_label,
            manager_id: bu.manager_id,
            unit_state_code: bu.unit_state_code,
            created_utc: bu.created_utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_unit_is_active() {
        let unit = BusinessUnit::new(Uuid::new_v4(), "Logistics".to_string(), None);
        assert!(!unit.is_archived());
    }

    #[test]
    fn test_directory_ref_carries_manager() {
        let manager = Uuid::new_v4();
        let unit = BusinessUnit::new(Uuid::new_v4(), "Logistics".to_string(), Some(manager));
        let r = unit.directory_ref();
        assert_eq!(r.business_unit_id, unit.business_unit_id);
        assert_eq!(r.manager_id, Some(manager));
    }
}
