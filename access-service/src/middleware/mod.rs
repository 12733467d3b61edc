pub mod auth;
pub mod guard;
pub mod metrics;
pub mod security_headers;
pub mod tracing;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
pub use guard::require_permission;
pub use metrics::metrics_middleware;
pub use security_headers::security_headers_middleware;
pub use tracing::request_id_middleware;
