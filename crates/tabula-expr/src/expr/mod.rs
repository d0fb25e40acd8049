//! Expression types for indexed optimization modeling.
//!
//! - `core`       — Expression: keyed rows of folded linear terms
//! - `operand`    — Operand: the tagged inputs arithmetic accepts
//! - `reshape`    — summation, shifting, and filtering over dimensions
//! - `constraint` — ConstraintExpr / Constraint: normalized comparisons
//! - `error`      — Expression construction errors

pub mod constraint;
pub mod core;
pub mod error;
pub mod operand;
mod reshape;

pub use constraint::{ComparisonSense, Constraint, ConstraintExpr, ConstraintRow};
pub use self::core::{Expression, Term};
pub(crate) use self::core::Row;
pub use error::ExprError;
pub use operand::Operand;
