//! Input records the evaluator reads.
//!
//! Both types are snapshots built by the data layer; the evaluator never
//! fetches anything itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

/// The evaluator's view of a user.
///
/// `role` is `None` when the stored role code is missing or unrecognized;
/// the evaluator denies such subjects everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub user_id: Uuid,
    pub role: Option<Role>,
    /// Home business unit, where the user's data lives. Admins and some
    /// managers have none.
    pub business_unit_id: Option<Uuid>,
}

impl Subject {
    pub fn new(user_id: Uuid, role: Option<Role>, business_unit_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role,
            business_unit_id,
        }
    }
}

/// One business unit as seen by the scoping check: its id and who is
/// recorded as its manager. A full directory is the organization's list of
/// these, captured in a single read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessUnitRef {
    pub business_unit_id: Uuid,
    pub manager_id: Option<Uuid>,
}

impl BusinessUnitRef {
    pub fn new(business_unit_id: Uuid, manager_id: Option<Uuid>) -> Self {
        Self {
            business_unit_id,
            manager_id,
        }
    }
}
