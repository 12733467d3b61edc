//! Access denial audit events.

use access_core::Permission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One recorded access denial.
///
/// Only denials are recorded; successful checks are far too frequent to
/// persist and carry no investigative value.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessDenial {
    pub denial_id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub permission_code: String,
    pub business_unit_id: Option<Uuid>,
    pub endpoint: String,
    pub method: String,
    pub recorded_utc: DateTime<Utc>,
}

impl AccessDenial {
    pub fn new(
        user_id: Uuid,
        organization_id: Uuid,
        permission: Permission,
        business_unit_id: Option<Uuid>,
        endpoint: String,
        method: String,
    ) -> Self {
        Self {
            denial_id: Uuid::new_v4(),
            user_id,
            organization_id,
            permission_code: permission.as_str().to_string(),
            business_unit_id,
            endpoint,
            method,
            recorded_utc: Utc::now(),
        }
    }
}
