//! Access guard service.
//!
//! Bridges the pure evaluator to the service: loads the subject and the
//! organization's unit directory, evaluates, and converts denials into
//! `403 Forbidden` plus an audit event. Route guards and handlers go
//! through here; nothing else in the service calls the evaluator directly.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::AccessDenial;
use access_core::{AccessEvaluator, BusinessUnitRef, Permission, Subject};

/// Where a denied request came from, for the audit trail.
#[derive(Debug, Clone)]
pub struct RequestOrigin {
    pub method: String,
    pub endpoint: String,
}

/// Supplies the evaluator's inputs from storage.
///
/// The database implements this; tests substitute an in-memory directory.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// The evaluator's view of a user, or `None` when the user is unknown
    /// or inactive.
    async fn load_subject(&self, user_id: Uuid) -> Result<Option<Subject>, AppError>;

    /// Snapshot of the organization's business units.
    async fn business_units(&self, organization_id: Uuid)
        -> Result<Vec<BusinessUnitRef>, AppError>;
}

/// Records access denials.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_denial(&self, denial: AccessDenial) -> Result<(), AppError>;
}

/// The guard every protected route goes through.
#[derive(Clone)]
pub struct AccessService {
    directory: Arc<dyn DirectoryProvider>,
    audit: Arc<dyn AuditSink>,
}

impl AccessService {
    pub fn new(directory: Arc<dyn DirectoryProvider>, audit: Arc<dyn AuditSink>) -> Self {
        Self { directory, audit }
    }

    /// Load the evaluator's view of a user.
    pub async fn subject(&self, user_id: Uuid) -> Result<Option<Subject>, AppError> {
        self.directory.load_subject(user_id).await
    }

    /// Evaluate a single check without side effects.
    ///
    /// The directory snapshot is only fetched when the role gate passes and
    /// a target unit is named; a role without the permission is denied
    /// before storage is consulted.
    pub async fn decide(
        &self,
        subject: Option<&Subject>,
        organization_id: Uuid,
        permission: Permission,
        business_unit_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let allowed = if !AccessEvaluator::has_permission(subject, permission) {
            false
        } else {
            let directory = if business_unit_id.is_some() {
                self.directory.business_units(organization_id).await?
            } else {
                Vec::new()
            };
            AccessEvaluator::can_perform_action(subject, permission, business_unit_id, &directory)
        };

        crate::services::metrics::record_access_decision(permission.as_str(), allowed);
        Ok(allowed)
    }

    /// Evaluate and enforce: `Ok(())` on allow, `Forbidden` plus an audit
    /// event on deny.
    pub async fn authorize(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        permission: Permission,
        business_unit_id: Option<Uuid>,
        origin: &RequestOrigin,
    ) -> Result<(), AppError> {
        let subject = self.subject(user_id).await?;

        if self
            .decide(subject.as_ref(), organization_id, permission, business_unit_id)
            .await?
        {
            return Ok(());
        }

        tracing::warn!(
            user_id = %user_id,
            permission = %permission,
            business_unit_id = ?business_unit_id,
            endpoint = %origin.endpoint,
            "Access denied"
        );

        self.audit
            .record_denial(AccessDenial::new(
                user_id,
                organization_id,
                permission,
                business_unit_id,
                origin.endpoint.clone(),
                origin.method.clone(),
            ))
            .await?;

        Err(AppError::Forbidden(anyhow::anyhow!(
            "Missing {} permission",
            permission
        )))
    }
}
