pub mod audit_log;
pub mod business_unit;
pub mod organization;
pub mod user;

pub use audit_log::AccessDenial;
pub use business_unit::{BusinessUnit, BusinessUnitResponse, BusinessUnitState};
pub use organization::{Organization, OrganizationState};
pub use user::{User, UserResponse, UserState};
