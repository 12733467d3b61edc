//! HTTP handlers for the access service.

pub mod access;
pub mod business_unit;
pub mod metrics;
pub mod user;

pub use access::*;
pub use business_unit::*;
pub use user::*;
