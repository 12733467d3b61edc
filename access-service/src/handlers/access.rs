//! Access inspection handlers.
//!
//! These endpoints let clients ask the same questions the route guards
//! ask, so UI gating renders from served decisions instead of a second
//! copy of the role table.

use axum::extract::{Json, Query, State};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::AppState;
use access_core::{AccessEvaluator, Permission, Role, Subject};

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Query params for a single access check.
#[derive(Debug, Deserialize, IntoParams)]
pub struct CheckQuery {
    /// Permission code to check
    #[param(value_type = String, example = "manage_business_unit")]
    pub permission: Permission,
    /// Target business unit for scoped checks
    pub business_unit_id: Option<Uuid>,
}

/// Single access check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckResponse {
    pub allowed: bool,
    #[schema(value_type = String)]
    pub permission: Permission,
    pub business_unit_id: Option<Uuid>,
}

/// One check inside a batch evaluation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessCheck {
    #[schema(value_type = String, example = "upload_data")]
    pub permission: Permission,
    pub business_unit_id: Option<Uuid>,
}

/// Batch evaluation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EvaluateRequest {
    pub checks: Vec<AccessCheck>,
}

/// Single decision with its reason.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccessDecision {
    #[schema(value_type = String)]
    pub permission: Permission,
    pub business_unit_id: Option<Uuid>,
    pub allowed: bool,
    pub reason: String,
}

/// Batch evaluation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluateResponse {
    pub user_id: Uuid,
    pub all_allowed: bool,
    pub decisions: Vec<AccessDecision>,
}

/// A business unit the caller can reach.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccessibleUnit {
    pub business_unit_id: Uuid,
    pub unit_label: String,
    pub unit_state_code: String,
}

/// The caller's effective access, for UI gating.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContextResponse {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    #[schema(value_type = Option<String>)]
    pub role: Option<Role>,
    #[schema(value_type = Vec<String>)]
    pub permissions: Vec<Permission>,
    pub business_units: Vec<AccessibleUnit>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Check a single permission, optionally against a business unit.
#[utoipa::path(
    get,
    path = "/access/check",
    params(CheckQuery),
    responses(
        (status = 200, description = "Decision for the requested check", body = CheckResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Access"
)]
pub async fn check_access(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>, AppError> {
    let subject = state.access.subject(user.user_id).await?;
    let allowed = state
        .access
        .decide(
            subject.as_ref(),
            user.organization_id,
            query.permission,
            query.business_unit_id,
        )
        .await?;

    Ok(Json(CheckResponse {
        allowed,
        permission: query.permission,
        business_unit_id: query.business_unit_id,
    }))
}

/// Evaluate a batch of permission checks in one round trip.
#[utoipa::path(
    post,
    path = "/access/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Decision per check", body = EvaluateResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Access"
)]
pub async fn evaluate_access(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let subject = state.access.subject(user.user_id).await?;

    // One directory snapshot serves the whole batch.
    let directory = if req.checks.iter().any(|c| c.business_unit_id.is_some()) {
        state
            .db
            .find_business_units_by_organization(user.organization_id)
            .await?
            .iter()
            .map(|unit| unit.directory_ref())
            .collect()
    } else {
        Vec::new()
    };

    let decisions: Vec<AccessDecision> = req
        .checks
        .iter()
        .map(|check| decide_with_reason(subject.as_ref(), check, &directory))
        .collect();
    let all_allowed = decisions.iter().all(|d| d.allowed);

    Ok(Json(EvaluateResponse {
        user_id: user.user_id,
        all_allowed,
        decisions,
    }))
}

/// The caller's role, permissions, and reachable business units.
#[utoipa::path(
    get,
    path = "/access/context",
    responses(
        (status = 200, description = "Effective access of the caller", body = ContextResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Access"
)]
pub async fn access_context(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ContextResponse>, AppError> {
    let subject = state.access.subject(user.user_id).await?;

    let units = state
        .db
        .find_business_units_by_organization(user.organization_id)
        .await?;
    let directory: Vec<_> = units.iter().map(|unit| unit.directory_ref()).collect();

    let business_units = units
        .iter()
        .filter(|unit| {
            AccessEvaluator::has_business_unit_access(
                subject.as_ref(),
                Some(unit.business_unit_id),
                &directory,
            )
        })
        .map(|unit| AccessibleUnit {
            business_unit_id: unit.business_unit_id,
            unit_label: unit.unit_label.clone(),
            unit_state_code: unit.unit_state_code.clone(),
        })
        .collect();

    let role = subject.as_ref().and_then(|s| s.role);
    let permissions = role.map(|r| r.grants().to_vec()).unwrap_or_default();

    Ok(Json(ContextResponse {
        user_id: user.user_id,
        organization_id: user.organization_id,
        role,
        permissions,
        business_units,
    }))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Evaluate one check and name which gate decided it.
fn decide_with_reason(
    subject: Option<&Subject>,
    check: &AccessCheck,
    directory: &[access_core::BusinessUnitRef],
) -> AccessDecision {
    let (allowed, reason) = if !AccessEvaluator::has_permission(subject, check.permission) {
        (false, "Role does not grant this permission".to_string())
    } else if check.business_unit_id.is_none() {
        (true, "Permission granted".to_string())
    } else if AccessEvaluator::has_business_unit_access(
        subject,
        check.business_unit_id,
        directory,
    ) {
        (true, "Permission granted within business unit".to_string())
    } else {
        (false, "Business unit out of scope".to_string())
    };

    AccessDecision {
        permission: check.permission,
        business_unit_id: check.business_unit_id,
        allowed,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_core::BusinessUnitRef;

    fn uuid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    #[test]
    fn test_reason_names_the_failing_gate() {
        let member = Subject::new(uuid(1), Some(Role::TeamMember), Some(uuid(2)));

        let no_permission = decide_with_reason(
            Some(&member),
            &AccessCheck {
                permission: Permission::ManageUsers,
                business_unit_id: Some(uuid(2)),
            },
            &[],
        );
        assert!(!no_permission.allowed);
        assert_eq!(no_permission.reason, "Role does not grant this permission");

        let out_of_scope = decide_with_reason(
            Some(&member),
            &AccessCheck {
                permission: Permission::UploadData,
                business_unit_id: Some(uuid(3)),
            },
            &[BusinessUnitRef::new(uuid(3), None)],
        );
        assert!(!out_of_scope.allowed);
        assert_eq!(out_of_scope.reason, "Business unit out of scope");

        let granted = decide_with_reason(
            Some(&member),
            &AccessCheck {
                permission: Permission::UploadData,
                business_unit_id: Some(uuid(2)),
            },
            &[],
        );
        assert!(granted.allowed);
    }

    #[test]
    fn test_missing_subject_is_denied_with_reason() {
        let decision = decide_with_reason(
            None,
            &AccessCheck {
                permission: Permission::ViewBusinessUnit,
                business_unit_id: None,
            },
            &[],
        );
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Role does not grant this permission");
    }
}
