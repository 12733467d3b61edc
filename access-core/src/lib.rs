//! Shared access-control core for the carbon platform.
//!
//! Defines the closed role and permission sets, the static role→permission
//! table, and the evaluator that every route guard and UI gate consults.
//! Defining them once here keeps the server and any client bridge on the
//! same table.
//!
//! The evaluator is a pure, synchronous predicate over its arguments and a
//! read-only static table. Every missing or malformed input resolves to
//! denial, never an error.

pub mod evaluator;
pub mod permission;
pub mod role;
pub mod subject;

pub use evaluator::AccessEvaluator;
pub use permission::Permission;
pub use role::Role;
pub use subject::{BusinessUnitRef, Subject};

/// Error returned when parsing a role or permission code fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown code: {0}")]
pub struct ParseCodeError(pub String);
