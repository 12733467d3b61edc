//! User handlers: profile plus the administrative mutations that feed the
//! evaluator (role and home-unit assignment).

use axum::extract::{Json, Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{User, UserResponse};
use crate::AppState;
use access_core::Role;

// ============================================================================
// Request DTOs
// ============================================================================

/// Request to change a user's role.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role_code: String,
}

/// Request to move a user to a business unit (or unassign them).
#[derive(Debug, Deserialize)]
pub struct UpdateUserBusinessUnitRequest {
    pub business_unit_id: Option<Uuid>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the caller's profile.
///
/// GET /users/me
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let me = state
        .db
        .find_user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(UserResponse::from(me)))
}

/// List users in an organization.
///
/// GET /organizations/:organization_id/users
/// Route group requires the manage_users permission.
pub async fn list_organization_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    if organization_id != user.organization_id {
        return Err(AppError::NotFound(anyhow::anyhow!("Organization not found")));
    }

    let users = state.db.find_users_by_organization(organization_id).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Change a user's role.
///
/// PUT /users/:user_id/role
/// Route group requires the manage_users permission.
pub async fn update_user_role(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    // Only recognized codes may be stored; unknown codes would silently
    // strip the user of all access.
    let role: Role = req
        .role_code
        .parse()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Unknown role code")))?;

    let mut target = find_user_in_org(&state, user.organization_id, user_id).await?;

    state.db.update_user_role(user_id, role.as_str()).await?;
    target.role_code = role.as_str().to_string();

    tracing::info!(
        user_id = %user_id,
        role = %role,
        changed_by = %user.user_id,
        "User role changed"
    );

    Ok(Json(UserResponse::from(target)))
}

/// Move a user to a business unit, or unassign them.
///
/// PUT /users/:user_id/business-unit
/// Route group requires the manage_users permission.
pub async fn update_user_business_unit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserBusinessUnitRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let mut target = find_user_in_org(&state, user.organization_id, user_id).await?;

    if let Some(business_unit_id) = req.business_unit_id {
        let unit = state
            .db
            .find_business_unit_by_id(business_unit_id)
            .await?
            .filter(|u| u.organization_id == user.organization_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Business unit not found")))?;

        if unit.is_archived() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot assign a user to an archived business unit"
            )));
        }
    }

    state
        .db
        .update_user_business_unit(user_id, req.business_unit_id)
        .await?;
    target.business_unit_id = req.business_unit_id;

    Ok(Json(UserResponse::from(target)))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Load a user, treating cross-organization ids as not found.
async fn find_user_in_org(
    state: &AppState,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<User, AppError> {
    state
        .db
        .find_user_by_id(user_id)
        .await?
        .filter(|u| u.organization_id == organization_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))
}
