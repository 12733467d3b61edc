pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;

use axum::{
    extract::{Request, State},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::SecurityScheme,
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AccessConfig;
use crate::error::AppError;
use crate::middleware::{
    metrics_middleware, request_id_middleware, require_permission, security_headers_middleware,
};
use crate::services::{AccessService, Database, JwtVerifier};
use access_core::Permission;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::access::check_access,
        handlers::access::evaluate_access,
        handlers::access::access_context,
    ),
    components(
        schemas(
            handlers::access::CheckResponse,
            handlers::access::AccessCheck,
            handlers::access::EvaluateRequest,
            handlers::access::AccessDecision,
            handlers::access::EvaluateResponse,
            handlers::access::AccessibleUnit,
            handlers::access::ContextResponse,
            models::UserResponse,
            models::BusinessUnitResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Access", description = "Access checks and effective permissions"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AccessConfig,
    pub db: Database,
    pub jwt: JwtVerifier,
    pub access: AccessService,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // User administration requires the manage_users permission; the
    // permission is global, so one guard layer covers the group.
    let access = state.access.clone();
    let admin_routes = Router::new()
        .route(
            "/organizations/:organization_id/users",
            get(handlers::user::list_organization_users),
        )
        .route("/users/:user_id/role", put(handlers::user::update_user_role))
        .route(
            "/users/:user_id/business-unit",
            put(handlers::user::update_user_business_unit),
        )
        .layer(from_fn_with_state(
            access,
            |access: State<AccessService>, req: Request, next: Next| {
                require_permission(access, Permission::ManageUsers, req, next)
            },
        ));

    // Everything below requires a verified token; business-unit-scoped
    // routes authorize in their handlers where the target id is known.
    let protected_routes = Router::new()
        .route("/access/check", get(handlers::access::check_access))
        .route("/access/evaluate", post(handlers::access::evaluate_access))
        .route("/access/context", get(handlers::access::access_context))
        .route(
            "/business-units",
            post(handlers::business_unit::create_business_unit),
        )
        .route(
            "/business-units/:business_unit_id",
            get(handlers::business_unit::get_business_unit)
                .patch(handlers::business_unit::update_business_unit),
        )
        .route(
            "/business-units/:business_unit_id/archive",
            post(handlers::business_unit::archive_business_unit),
        )
        .route(
            "/business-units/:business_unit_id/manager",
            put(handlers::business_unit::assign_manager),
        )
        .route(
            "/organizations/:organization_id/business-units",
            get(handlers::business_unit::list_business_units),
        )
        .route("/users/me", get(handlers::user::get_me))
        .merge(admin_routes)
        .layer(from_fn_with_state(
            state.jwt.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    // Only add Swagger UI if enabled in config
    let swagger_enabled = match state.config.environment {
        crate::config::Environment::Dev => true,
        crate::config::Environment::Prod => match state.config.swagger.enabled {
            crate::config::SwaggerMode::Public | crate::config::SwaggerMode::Authenticated => true,
            crate::config::SwaggerMode::Disabled => false,
        },
    };

    if swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        // Still serve the OpenAPI JSON for programmatic access
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .merge(protected_routes)
        .with_state(state.clone())
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::PUT,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::HeaderName::from_static("x-request-id"),
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    // Check PostgreSQL connection
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "PostgreSQL health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up"
        }
    })))
}
