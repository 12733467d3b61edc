//! Route guard tests against an in-memory directory.
//!
//! Verifies that the permission guard middleware turns evaluator denials
//! into 403 responses and records them, without touching PostgreSQL.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state, Next},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use access_core::{BusinessUnitRef, Permission, Role, Subject};
use access_service::error::AppError;
use access_service::middleware::{require_permission, CurrentUser};
use access_service::models::AccessDenial;
use access_service::services::{AccessService, AuditSink, DirectoryProvider};

struct MemoryDirectory {
    subjects: HashMap<Uuid, Subject>,
    units: Vec<BusinessUnitRef>,
}

#[async_trait]
impl DirectoryProvider for MemoryDirectory {
    async fn load_subject(&self, user_id: Uuid) -> Result<Option<Subject>, AppError> {
        Ok(self.subjects.get(&user_id).cloned())
    }

    async fn business_units(
        &self,
        _organization_id: Uuid,
    ) -> Result<Vec<BusinessUnitRef>, AppError> {
        Ok(self.units.clone())
    }
}

#[derive(Default)]
struct RecordingAudit {
    denials: Mutex<Vec<AccessDenial>>,
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record_denial(&self, denial: AccessDenial) -> Result<(), AppError> {
        self.denials.lock().unwrap().push(denial);
        Ok(())
    }
}

fn guarded_app(
    subject: Subject,
    permission: Permission,
) -> (Router, Arc<RecordingAudit>, CurrentUser) {
    let user = CurrentUser {
        user_id: subject.user_id,
        organization_id: Uuid::new_v4(),
        email: "user@example.com".to_string(),
    };

    let directory = MemoryDirectory {
        subjects: HashMap::from([(subject.user_id, subject)]),
        units: Vec::new(),
    };
    let audit = Arc::new(RecordingAudit::default());
    let access = AccessService::new(Arc::new(directory), audit.clone());

    let identity = user.clone();
    let app = Router::new()
        .route("/admin", get(|| async { "ok" }))
        .layer(from_fn_with_state(
            access,
            move |access: State<AccessService>, req: Request, next: Next| {
                require_permission(access, permission, req, next)
            },
        ))
        // Stand-in for the auth middleware: puts the caller in extensions.
        .layer(from_fn(move |mut req: Request, next: Next| {
            let identity = identity.clone();
            async move {
                req.extensions_mut().insert(identity);
                next.run(req).await
            }
        }));

    (app, audit, user)
}

#[tokio::test]
async fn admin_passes_the_guard() {
    let subject = Subject::new(Uuid::new_v4(), Some(Role::Admin), None);
    let (app, audit, _) = guarded_app(subject, Permission::ManageUsers);

    let response = app
        .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(audit.denials.lock().unwrap().is_empty());
}

#[tokio::test]
async fn team_member_is_forbidden_and_audited() {
    let subject = Subject::new(Uuid::new_v4(), Some(Role::TeamMember), Some(Uuid::new_v4()));
    let (app, audit, user) = guarded_app(subject, Permission::ManageUsers);

    let response = app
        .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let denials = audit.denials.lock().unwrap();
    assert_eq!(denials.len(), 1);
    assert_eq!(denials[0].user_id, user.user_id);
    assert_eq!(denials[0].permission_code, "manage_users");
    assert_eq!(denials[0].endpoint, "/admin");
    assert_eq!(denials[0].method, "GET");
}

#[tokio::test]
async fn user_without_role_is_forbidden() {
    // The caller exists but carries no recognized role: fail closed.
    let subject = Subject::new(Uuid::new_v4(), None, None);
    let (app, audit, _) = guarded_app(subject, Permission::ManageUsers);

    let response = app
        .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(audit.denials.lock().unwrap().len(), 1);
}
