//! Services layer for the access service.

pub mod access;
mod database;
mod jwt;
pub mod metrics;

pub use access::{AccessService, AuditSink, DirectoryProvider, RequestOrigin};
pub use database::Database;
pub use jwt::{AccessClaims, JwtVerifier};
