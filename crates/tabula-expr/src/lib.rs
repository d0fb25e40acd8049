//! Indexed linear expressions for LP/MIP model generation.
//!
//! - `index` — index values, dimension keys, and index sets
//! - `table` — coefficient tables supplied by the data layer
//! - `align` — relational join / broadcast of two keyed row sets
//! - `expr`  — Expression algebra and the constraint builder

pub mod align;
pub mod expr;
pub mod ids;
pub mod index;
pub mod table;

pub use expr::{
    ComparisonSense, Constraint, ConstraintExpr, ConstraintRow, ExprError, Expression, Operand,
    Term,
};
pub use ids::{ConstraintId, VariableId};
pub use index::{DimensionKey, IndexSet, IndexValue};
pub use table::CoefficientTable;
