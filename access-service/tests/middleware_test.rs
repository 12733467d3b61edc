//! Middleware tests that run without any backing infrastructure.
//!
//! Exercises the authentication middleware with real signed tokens and the
//! plain request/response middleware (security headers, request ids).

use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::io::Write;
use tempfile::NamedTempFile;
use tower::ServiceExt;
use uuid::Uuid;

use access_service::config::JwtConfig;
use access_service::middleware::{
    auth_middleware, request_id_middleware, security_headers_middleware, CurrentUser,
};
use access_service::services::{AccessClaims, JwtVerifier};

fn generate_keys() -> (String, NamedTempFile) {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("keygen failed");
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("private pem")
        .to_string();
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .expect("public pem");

    let mut public_file = NamedTempFile::new().expect("tempfile");
    public_file
        .write_all(public_pem.as_bytes())
        .expect("write public key");

    (private_pem, public_file)
}

fn sign(private_pem: &str, claims: &AccessClaims) -> String {
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key");
    encode(&Header::new(Algorithm::RS256), claims, &key).expect("encode")
}

fn claims(sub: &str, org: &str) -> AccessClaims {
    let now = Utc::now();
    AccessClaims {
        sub: sub.to_string(),
        org: org.to_string(),
        email: "user@example.com".to_string(),
        exp: (now + Duration::minutes(15)).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    }
}

async fn whoami(Extension(user): Extension<CurrentUser>) -> String {
    format!("{}:{}", user.user_id, user.organization_id)
}

fn auth_router(public_key_file: &NamedTempFile) -> Router {
    let verifier = JwtVerifier::new(&JwtConfig {
        public_key_path: public_key_file.path().to_str().unwrap().to_string(),
    })
    .expect("verifier");

    Router::new()
        .route("/whoami", get(whoami))
        .layer(from_fn_with_state(verifier, auth_middleware))
}

// ============================================================================
// Authentication Middleware Tests
// ============================================================================

#[tokio::test]
async fn auth_middleware_rejects_missing_header() {
    let (_, public_file) = generate_keys();
    let app = auth_router(&public_file);

    let response = app
        .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_middleware_rejects_garbage_token() {
    let (_, public_file) = generate_keys();
    let app = auth_router(&public_file);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_middleware_rejects_malformed_subject() {
    let (private_pem, public_file) = generate_keys();
    let app = auth_router(&public_file);

    // Valid signature, but the subject is not a UUID.
    let token = sign(&private_pem, &claims("not-a-uuid", &Uuid::new_v4().to_string()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_middleware_provides_current_user() {
    let (private_pem, public_file) = generate_keys();
    let app = auth_router(&public_file);

    let user_id = Uuid::new_v4();
    let organization_id = Uuid::new_v4();
    let token = sign(
        &private_pem,
        &claims(&user_id.to_string(), &organization_id.to_string()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        String::from_utf8(body.to_vec()).unwrap(),
        format!("{}:{}", user_id, organization_id)
    );
}

// ============================================================================
// Security Headers Tests
// ============================================================================

#[tokio::test]
async fn security_headers_are_applied_to_api_routes() {
    let app = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .layer(from_fn(security_headers_middleware));

    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        headers.get("content-security-policy").unwrap(),
        "default-src 'none'; frame-ancestors 'none'"
    );
    assert!(headers.get("strict-transport-security").is_some());
}

// ============================================================================
// Request ID Tests
// ============================================================================

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let app = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .layer(from_fn(request_id_middleware));

    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(request_id.to_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn request_id_is_propagated_when_present() {
    let app = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .layer(from_fn(request_id_middleware));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ping")
                .header("x-request-id", "test-request-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-request-42"
    );
}
