//! Role codes and the static role→permission table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ParseCodeError, Permission};

/// A user's role within their organization.
///
/// The set is closed; the table in [`Role::grants`] is the single source of
/// truth for what each role may do. Stored role codes that fail to parse
/// are treated as "no role" by the data layer, which the evaluator denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Organization administrator. Historically also stored as
    /// `super_admin`; both codes parse to this variant.
    #[serde(alias = "super_admin")]
    Admin,
    /// Manages one or more business units.
    BusinessUnitManager,
    /// Regular member of a single business unit.
    TeamMember,
    /// Read-only reviewer with financial visibility.
    Auditor,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::BusinessUnitManager,
        Role::TeamMember,
        Role::Auditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::BusinessUnitManager => "business_unit_manager",
            Role::TeamMember => "team_member",
            Role::Auditor => "auditor",
        }
    }

    /// The permissions this role holds unconditionally.
    ///
    /// Invariants: every row is non-empty, and the admin row is a superset
    /// of every other row. Business-unit scoping is a separate gate layered
    /// on top by the evaluator.
    pub fn grants(&self) -> &'static [Permission] {
        match self {
            Role::Admin => &[
                Permission::ViewBusinessUnit,
                Permission::ManageBusinessUnit,
                Permission::UploadData,
                Permission::ApproveData,
                Permission::ManageUsers,
                Permission::ViewFinancials,
                Permission::ManageSubscription,
            ],
            Role::BusinessUnitManager => &[
                Permission::ViewBusinessUnit,
                Permission::ManageBusinessUnit,
                Permission::UploadData,
                Permission::ApproveData,
                Permission::ViewFinancials,
            ],
            Role::TeamMember => &[Permission::ViewBusinessUnit, Permission::UploadData],
            Role::Auditor => &[Permission::ViewBusinessUnit, Permission::ViewFinancials],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" | "super_admin" => Ok(Role::Admin),
            "business_unit_manager" => Ok(Role::BusinessUnitManager),
            "team_member" => Ok(Role::TeamMember),
            "auditor" => Ok(Role::Auditor),
            other => Err(ParseCodeError(other.to_string())),
        }
    }
}
