//! The access evaluator.
//!
//! Answers "may this user perform this permission, optionally against this
//! business unit?" the same way for every caller. Stateless per call; the
//! only table it reads is [`Role::grants`].
//!
//! Every check fails closed: a missing subject, a missing role, or a
//! missing target id is a denial, never an error.

use uuid::Uuid;

use crate::{BusinessUnitRef, Permission, Role, Subject};

/// Access evaluation entry points.
#[derive(Debug, Clone)]
pub struct AccessEvaluator;

impl AccessEvaluator {
    /// Does the subject's role grant `permission` at all?
    ///
    /// Pure table lookup; business-unit scoping is not consulted.
    pub fn has_permission(subject: Option<&Subject>, permission: Permission) -> bool {
        let Some(subject) = subject else {
            return false;
        };
        let Some(role) = subject.role else {
            return false;
        };
        role.grants().contains(&permission)
    }

    /// May the subject act within the given business unit?
    ///
    /// Checked in order, first match wins:
    /// 1. admins bypass scoping entirely;
    /// 2. managers reach their home unit, plus any directory entry that
    ///    records them as manager (delegation - the unit need not be the
    ///    one they belong to);
    /// 3. everyone else reaches exactly their home unit.
    ///
    /// `directory` is the organization's unit snapshot; pass an empty slice
    /// when none is available, which leaves only the home-unit match.
    /// Permission level is not consulted here.
    pub fn has_business_unit_access(
        subject: Option<&Subject>,
        business_unit_id: Option<Uuid>,
        directory: &[BusinessUnitRef],
    ) -> bool {
        let Some(subject) = subject else {
            return false;
        };
        let Some(target) = business_unit_id else {
            return false;
        };

        match subject.role {
            Some(Role::Admin) => true,
            Some(Role::BusinessUnitManager) => {
                subject.business_unit_id == Some(target)
                    || directory.iter().any(|unit| {
                        unit.business_unit_id == target
                            && unit.manager_id == Some(subject.user_id)
                    })
            }
            _ => subject.business_unit_id == Some(target),
        }
    }

    /// The composed check route guards call.
    ///
    /// Permission first; a role without the capability is denied before
    /// scoping is ever evaluated. With no target unit the action is global
    /// and the permission alone decides.
    pub fn can_perform_action(
        subject: Option<&Subject>,
        permission: Permission,
        business_unit_id: Option<Uuid>,
        directory: &[BusinessUnitRef],
    ) -> bool {
        if !Self::has_permission(subject, permission) {
            return false;
        }
        match business_unit_id {
            None => true,
            Some(_) => Self::has_business_unit_access(subject, business_unit_id, directory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn subject(role: Option<Role>, business_unit: Option<Uuid>) -> Subject {
        Subject::new(uuid(1), role, business_unit)
    }

    #[test]
    fn test_has_permission_matches_table_for_every_role() {
        for role in Role::ALL {
            let subject = subject(Some(role), None);
            for permission in Permission::ALL {
                assert_eq!(
                    AccessEvaluator::has_permission(Some(&subject), permission),
                    role.grants().contains(&permission),
                    "role {} / permission {}",
                    role,
                    permission
                );
            }
        }
    }

    #[test]
    fn test_has_permission_denies_missing_subject_and_role() {
        for permission in Permission::ALL {
            assert!(!AccessEvaluator::has_permission(None, permission));
            assert!(!AccessEvaluator::has_permission(
                Some(&subject(None, Some(uuid(2)))),
                permission
            ));
        }
    }

    #[test]
    fn test_admin_bypasses_scoping_even_for_unknown_units() {
        let admin = subject(Some(Role::Admin), None);
        // Not present in any directory, still allowed.
        assert!(AccessEvaluator::has_business_unit_access(
            Some(&admin),
            Some(uuid(9)),
            &[]
        ));
        let directory = [BusinessUnitRef::new(uuid(2), Some(uuid(3)))];
        assert!(AccessEvaluator::has_business_unit_access(
            Some(&admin),
            Some(uuid(9)),
            &directory
        ));
    }

    #[test]
    fn test_team_member_reaches_exactly_their_home_unit() {
        let home = uuid(2);
        let other = uuid(3);
        let member = subject(Some(Role::TeamMember), Some(home));

        assert!(AccessEvaluator::has_business_unit_access(
            Some(&member),
            Some(home),
            &[]
        ));
        // Appearing in the directory under another manager changes nothing.
        let directory = [BusinessUnitRef::new(other, Some(uuid(4)))];
        assert!(!AccessEvaluator::has_business_unit_access(
            Some(&member),
            Some(other),
            &directory
        ));
    }

    #[test]
    fn test_manager_reaches_home_unit() {
        let home = uuid(2);
        let manager = subject(Some(Role::BusinessUnitManager), Some(home));
        assert!(AccessEvaluator::has_business_unit_access(
            Some(&manager),
            Some(home),
            &[]
        ));
    }

    #[test]
    fn test_manager_reaches_delegated_unit_via_directory() {
        let manager_id = uuid(1);
        let home = uuid(2);
        let delegated = uuid(3);
        let manager = Subject::new(manager_id, Some(Role::BusinessUnitManager), Some(home));

        let directory = [
            BusinessUnitRef::new(home, None),
            BusinessUnitRef::new(delegated, Some(manager_id)),
        ];
        assert!(AccessEvaluator::has_business_unit_access(
            Some(&manager),
            Some(delegated),
            &directory
        ));
    }

    #[test]
    fn test_manager_denied_without_home_or_delegation() {
        let manager = subject(Some(Role::BusinessUnitManager), Some(uuid(2)));
        let directory = [BusinessUnitRef::new(uuid(3), Some(uuid(4)))];
        assert!(!AccessEvaluator::has_business_unit_access(
            Some(&manager),
            Some(uuid(3)),
            &directory
        ));
        // Empty directory: delegation cannot apply.
        assert!(!AccessEvaluator::has_business_unit_access(
            Some(&manager),
            Some(uuid(3)),
            &[]
        ));
    }

    #[test]
    fn test_scoping_denies_missing_inputs() {
        let member = subject(Some(Role::TeamMember), Some(uuid(2)));
        assert!(!AccessEvaluator::has_business_unit_access(
            Some(&member),
            None,
            &[]
        ));
        assert!(!AccessEvaluator::has_business_unit_access(
            None,
            Some(uuid(2)),
            &[]
        ));
    }

    #[test]
    fn test_can_perform_action_short_circuits_on_permission() {
        // Directory that would grant scope access, but the role lacks the
        // permission - scoping must never rescue the check.
        let member = subject(Some(Role::TeamMember), Some(uuid(2)));
        let directory = [BusinessUnitRef::new(uuid(2), Some(member.user_id))];
        assert!(!AccessEvaluator::can_perform_action(
            Some(&member),
            Permission::ManageUsers,
            Some(uuid(2)),
            &directory
        ));
    }

    #[test]
    fn test_unscoped_action_equals_permission_check() {
        for role in Role::ALL {
            let subject = subject(Some(role), Some(uuid(2)));
            for permission in Permission::ALL {
                assert_eq!(
                    AccessEvaluator::can_perform_action(Some(&subject), permission, None, &[]),
                    AccessEvaluator::has_permission(Some(&subject), permission),
                    "role {} / permission {}",
                    role,
                    permission
                );
            }
        }
    }

    #[test]
    fn test_scoped_action_requires_both_gates() {
        let home = uuid(2);
        let other = uuid(3);
        let member = subject(Some(Role::TeamMember), Some(home));

        assert!(AccessEvaluator::can_perform_action(
            Some(&member),
            Permission::UploadData,
            Some(home),
            &[]
        ));
        assert!(!AccessEvaluator::can_perform_action(
            Some(&member),
            Permission::UploadData,
            Some(other),
            &[]
        ));
    }

    #[test]
    fn test_auditor_views_financials_in_home_unit_only() {
        let home = uuid(2);
        let auditor = subject(Some(Role::Auditor), Some(home));

        assert!(AccessEvaluator::can_perform_action(
            Some(&auditor),
            Permission::ViewFinancials,
            Some(home),
            &[]
        ));
        assert!(!AccessEvaluator::can_perform_action(
            Some(&auditor),
            Permission::ViewFinancials,
            Some(uuid(3)),
            &[]
        ));
    }

    #[test]
    fn test_manager_manages_delegated_unit() {
        let manager_id = uuid(1);
        let manager = Subject::new(manager_id, Some(Role::BusinessUnitManager), Some(uuid(2)));
        let directory = [BusinessUnitRef::new(uuid(3), Some(manager_id))];

        assert!(AccessEvaluator::can_perform_action(
            Some(&manager),
            Permission::ManageBusinessUnit,
            Some(uuid(3)),
            &directory
        ));
    }

    #[test]
    fn test_team_member_never_manages_users() {
        let home = uuid(2);
        let member = subject(Some(Role::TeamMember), Some(home));

        assert!(!AccessEvaluator::can_perform_action(
            Some(&member),
            Permission::ManageUsers,
            None,
            &[]
        ));
        assert!(!AccessEvaluator::can_perform_action(
            Some(&member),
            Permission::ManageUsers,
            Some(home),
            &[]
        ));
    }

    #[test]
    fn test_missing_subject_denies_everything() {
        let directory = [BusinessUnitRef::new(uuid(2), Some(uuid(3)))];
        for permission in Permission::ALL {
            assert!(!AccessEvaluator::has_permission(None, permission));
            assert!(!AccessEvaluator::can_perform_action(
                None,
                permission,
                None,
                &directory
            ));
            assert!(!AccessEvaluator::can_perform_action(
                None,
                permission,
                Some(uuid(2)),
                &directory
            ));
        }
        assert!(!AccessEvaluator::has_business_unit_access(
            None,
            Some(uuid(2)),
            &directory
        ));
    }

    #[test]
    fn test_repeated_calls_agree() {
        let manager = subject(Some(Role::BusinessUnitManager), Some(uuid(2)));
        let directory = [BusinessUnitRef::new(uuid(3), Some(manager.user_id))];
        let first = AccessEvaluator::can_perform_action(
            Some(&manager),
            Permission::ApproveData,
            Some(uuid(3)),
            &directory,
        );
        for _ in 0..3 {
            assert_eq!(
                AccessEvaluator::can_perform_action(
                    Some(&manager),
                    Permission::ApproveData,
                    Some(uuid(3)),
                    &directory,
                ),
                first
            );
        }
    }
}
