//! PostgreSQL database service for the access service.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AccessDenial, BusinessUnit, BusinessUnitState, Organization, User};
use crate::services::access::{AuditSink, DirectoryProvider};
use access_core::{BusinessUnitRef, Subject};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    // ==================== Organization Operations ====================

    /// Find organization by ID.
    pub async fn find_organization_by_id(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, AppError> {
        sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    // ==================== User Operations ====================

    /// Find user by ID.
    pub async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// List users in an organization.
    pub async fn find_users_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE organization_id = $1 ORDER BY created_utc",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Update a user's role code.
    pub async fn update_user_role(&self, user_id: Uuid, role_code: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET role_code = $1, updated_utc = now() WHERE user_id = $2")
            .bind(role_code)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    /// Update a user's home business unit.
    pub async fn update_user_business_unit(
        &self,
        user_id: Uuid,
        business_unit_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET business_unit_id = $1, updated_utc = now() WHERE user_id = $2",
        )
        .bind(business_unit_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    // ==================== Business Unit Operations ====================

    /// Find business unit by ID.
    pub async fn find_business_unit_by_id(
        &self,
        business_unit_id: Uuid,
    ) -> Result<Option<BusinessUnit>, AppError> {
        sqlx::query_as::<_, BusinessUnit>(
            "SELECT * FROM business_units WHERE business_unit_id = $1",
        )
        .bind(business_unit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// List business units in an organization.
    pub async fn find_business_units_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<BusinessUnit>, AppError> {
        sqlx::query_as::<_, BusinessUnit>(
            "SELECT * FROM business_units WHERE organization_id = $1 ORDER BY created_utc",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    /// Insert a new business unit.
    pub async fn insert_business_unit(&self, unit: &BusinessUnit) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO business_units (business_unit_id, organization_id, unit_label, manager_id, unit_state_code, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(unit.business_unit_id)
        .bind(unit.organization_id)
        .bind(&unit.unit_label)
        .bind(unit.manager_id)
        .bind(&unit.unit_state_code)
        .bind(unit.created_utc)
        .bind(unit.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    /// Rename a business unit.
    pub async fn update_business_unit_label(
        &self,
        business_unit_id: Uuid,
        unit_label: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE business_units SET unit_label = $1, updated_utc = now() WHERE business_unit_id = $2",
        )
        .bind(unit_label)
        .bind(business_unit_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    /// Record a manager on a business unit (or clear it).
    pub async fn set_business_unit_manager(
        &self,
        business_unit_id: Uuid,
        manager_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE business_units SET manager_id = $1, updated_utc = now() WHERE business_unit_id = $2",
        )
        .bind(manager_id)
        .bind(business_unit_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    /// Archive a business unit. State flip only; rows are never deleted.
    pub async fn archive_business_unit(&self, business_unit_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE business_units SET unit_state_code = $1, updated_utc = now() WHERE business_unit_id = $2",
        )
        .bind(BusinessUnitState::Archived.as_str())
        .bind(business_unit_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    // ==================== Audit Operations ====================

    /// Insert an access denial event.
    pub async fn insert_access_denial(&self, denial: &AccessDenial) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO access_audit_log (denial_id, user_id, organization_id, permission_code, business_unit_id, endpoint, method, recorded_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(denial.denial_id)
        .bind(denial.user_id)
        .bind(denial.organization_id)
        .bind(&denial.permission_code)
        .bind(denial.business_unit_id)
        .bind(&denial.endpoint)
        .bind(&denial.method)
        .bind(denial.recorded_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryProvider for Database {
    async fn load_subject(&self, user_id: Uuid) -> Result<Option<Subject>, AppError> {
        Ok(self
            .find_user_by_id(user_id)
            .await?
            .filter(User::is_active)
            .map(|user| user.subject()))
    }

    async fn business_units(&self, organization_id: Uuid) -> Result<Vec<BusinessUnitRef>, AppError> {
        // Archived units stay in the directory: a recorded manager keeps
        // access to a unit's history after it is archived.
        Ok(self
            .find_business_units_by_organization(organization_id)
            .await?
            .iter()
            .map(BusinessUnit::directory_ref)
            .collect())
    }
}

#[async_trait]
impl AuditSink for Database {
    async fn record_denial(&self, denial: AccessDenial) -> Result<(), AppError> {
        // Fire and forget: audit writes must never delay or fail a request.
        let db = self.clone();
        tokio::spawn(async move {
            if let Err(e) = db.insert_access_denial(&denial).await {
                tracing::error!(error = %e, "Failed to record access denial");
            }
        });
        Ok(())
    }
}
