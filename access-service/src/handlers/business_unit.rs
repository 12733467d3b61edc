//! Business unit directory handlers.
//!
//! The directory these endpoints maintain is exactly what the evaluator's
//! scoping gate reads. Units are archived, never deleted.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{BusinessUnit, BusinessUnitResponse};
use crate::services::RequestOrigin;
use crate::AppState;
use access_core::Permission;

// ============================================================================
// Request DTOs
// ============================================================================

/// Request to create a business unit.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBusinessUnitRequest {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub unit_label: String,
    pub manager_id: Option<Uuid>,
}

/// Request to rename a business unit.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBusinessUnitRequest {
    #[validate(length(min = 1, max = 120))]
    pub unit_label: String,
}

/// Request to record (or clear) the unit's manager.
#[derive(Debug, Deserialize)]
pub struct AssignManagerRequest {
    pub manager_id: Option<Uuid>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new business unit.
///
/// POST /business-units
pub async fn create_business_unit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    origin: RequestOrigin,
    Json(req): Json<CreateBusinessUnitRequest>,
) -> Result<(StatusCode, Json<BusinessUnitResponse>), AppError> {
    req.validate()?;

    // Cross-organization requests read as not-found, not as forbidden.
    if req.organization_id != user.organization_id {
        return Err(AppError::NotFound(anyhow::anyhow!("Organization not found")));
    }

    let organization = state
        .db
        .find_organization_by_id(req.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Organization not found")))?;

    if !organization.is_active() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Organization is suspended"
        )));
    }

    // Creation has no target unit yet; the permission alone gates it.
    state
        .access
        .authorize(
            user.user_id,
            user.organization_id,
            Permission::ManageBusinessUnit,
            None,
            &origin,
        )
        .await?;

    if let Some(manager_id) = req.manager_id {
        verify_member(&state, user.organization_id, manager_id).await?;
    }

    let unit = BusinessUnit::new(req.organization_id, req.unit_label, req.manager_id);
    state.db.insert_business_unit(&unit).await?;

    tracing::info!(
        business_unit_id = %unit.business_unit_id,
        organization_id = %unit.organization_id,
        "Business unit created"
    );

    Ok((StatusCode::CREATED, Json(BusinessUnitResponse::from(unit))))
}

/// List business units in an organization.
///
/// GET /organizations/:organization_id/business-units
pub async fn list_business_units(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    origin: RequestOrigin,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<Vec<BusinessUnitResponse>>, AppError> {
    if organization_id != user.organization_id {
        return Err(AppError::NotFound(anyhow::anyhow!("Organization not found")));
    }

    state
        .access
        .authorize(
            user.user_id,
            user.organization_id,
            Permission::ViewBusinessUnit,
            None,
            &origin,
        )
        .await?;

    let units = state
        .db
        .find_business_units_by_organization(organization_id)
        .await?;

    Ok(Json(
        units.into_iter().map(BusinessUnitResponse::from).collect(),
    ))
}

/// Get a business unit by ID.
///
/// GET /business-units/:business_unit_id
pub async fn get_business_unit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    origin: RequestOrigin,
    Path(business_unit_id): Path<Uuid>,
) -> Result<Json<BusinessUnitResponse>, AppError> {
    let unit = find_unit_in_org(&state, user.organization_id, business_unit_id).await?;

    state
        .access
        .authorize(
            user.user_id,
            user.organization_id,
            Permission::ViewBusinessUnit,
            Some(business_unit_id),
            &origin,
        )
        .await?;

    Ok(Json(BusinessUnitResponse::from(unit)))
}

/// Rename a business unit.
///
/// PATCH /business-units/:business_unit_id
pub async fn update_business_unit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    origin: RequestOrigin,
    Path(business_unit_id): Path<Uuid>,
    Json(req): Json<UpdateBusinessUnitRequest>,
) -> Result<Json<BusinessUnitResponse>, AppError> {
    req.validate()?;

    let mut unit = find_unit_in_org(&state, user.organization_id, business_unit_id).await?;

    state
        .access
        .authorize(
            user.user_id,
            user.organization_id,
            Permission::ManageBusinessUnit,
            Some(business_unit_id),
            &origin,
        )
        .await?;

    state
        .db
        .update_business_unit_label(business_unit_id, &req.unit_label)
        .await?;
    unit.unit_label = req.unit_label;

    Ok(Json(BusinessUnitResponse::from(unit)))
}

/// Archive a business unit. The row stays; only the state flips.
///
/// POST /business-units/:business_unit_id/archive
pub async fn archive_business_unit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    origin: RequestOrigin,
    Path(business_unit_id): Path<Uuid>,
) -> Result<Json<BusinessUnitResponse>, AppError> {
    let mut unit = find_unit_in_org(&state, user.organization_id, business_unit_id).await?;

    state
        .access
        .authorize(
            user.user_id,
            user.organization_id,
            Permission::ManageBusinessUnit,
            Some(business_unit_id),
            &origin,
        )
        .await?;

    if unit.is_archived() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Business unit is already archived"
        )));
    }

    state.db.archive_business_unit(business_unit_id).await?;
    unit.unit_state_code = crate::models::BusinessUnitState::Archived.as_str().to_string();

    tracing::info!(business_unit_id = %business_unit_id, "Business unit archived");

    Ok(Json(BusinessUnitResponse::from(unit)))
}

/// Record or clear the unit's manager.
///
/// PUT /business-units/:business_unit_id/manager
pub async fn assign_manager(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    origin: RequestOrigin,
    Path(business_unit_id): Path<Uuid>,
    Json(req): Json<AssignManagerRequest>,
) -> Result<Json<BusinessUnitResponse>, AppError> {
    let mut unit = find_unit_in_org(&state, user.organization_id, business_unit_id).await?;

    state
        .access
        .authorize(
            user.user_id,
            user.organization_id,
            Permission::ManageBusinessUnit,
            Some(business_unit_id),
            &origin,
        )
        .await?;

    if let Some(manager_id) = req.manager_id {
        verify_member(&state, user.organization_id, manager_id).await?;
    }

    state
        .db
        .set_business_unit_manager(business_unit_id, req.manager_id)
        .await?;
    unit.manager_id = req.manager_id;

    Ok(Json(BusinessUnitResponse::from(unit)))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Load a unit, treating cross-organization ids as not found.
async fn find_unit_in_org(
    state: &AppState,
    organization_id: Uuid,
    business_unit_id: Uuid,
) -> Result<BusinessUnit, AppError> {
    state
        .db
        .find_business_unit_by_id(business_unit_id)
        .await?
        .filter(|unit| unit.organization_id == organization_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Business unit not found")))
}

/// Ensure the referenced user exists, is active, and belongs to the
/// organization.
async fn verify_member(
    state: &AppState,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let member = state
        .db
        .find_user_by_id(user_id)
        .await?
        .filter(|u| u.organization_id == organization_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    if !member.is_active() {
        return Err(AppError::BadRequest(anyhow::anyhow!("User is not active")));
    }

    Ok(())
}
