//! Permission tags - the closed capability set of the platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseCodeError;

/// A named capability a role may hold.
///
/// Not persisted anywhere; the wire and database representation is the
/// snake_case code returned by [`Permission::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// View a business unit and its emissions data.
    ViewBusinessUnit,
    /// Create, rename, archive, or reassign a business unit.
    ManageBusinessUnit,
    /// Upload emissions records and supporting documents.
    UploadData,
    /// Approve uploaded emissions data.
    ApproveData,
    /// Manage user accounts and role assignments.
    ManageUsers,
    /// View financial figures attached to emissions records.
    ViewFinancials,
    /// Manage the organization's subscription.
    ManageSubscription,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 7] = [
        Permission::ViewBusinessUnit,
        Permission::ManageBusinessUnit,
        Permission::UploadData,
        Permission::ApproveData,
        Permission::ManageUsers,
        Permission::ViewFinancials,
        Permission::ManageSubscription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewBusinessUnit => "view_business_unit",
            Permission::ManageBusinessUnit => "manage_business_unit",
            Permission::UploadData => "upload_data",
            Permission::ApproveData => "approve_data",
            Permission::ManageUsers => "manage_users",
            Permission::ViewFinancials => "view_financials",
            Permission::ManageSubscription => "manage_subscription",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseCodeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for permission in Permission::ALL {
            let parsed: Permission = permission.as_str().parse().unwrap();
            assert_eq!(parsed, permission);
        }
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let result = "delete_everything".parse::<Permission>();
        assert_eq!(
            result,
            Err(ParseCodeError("delete_everything".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_snake_case_codes() {
        let json = serde_json::to_string(&Permission::ViewFinancials).unwrap();
        assert_eq!(json, "\"view_financials\"");

        let parsed: Permission = serde_json::from_str("\"manage_business_unit\"").unwrap();
        assert_eq!(parsed, Permission::ManageBusinessUnit);
    }
}
