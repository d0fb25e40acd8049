//! Constraint builder: turns `lhs <op> rhs` into normalized per-key rows.
//!
//! After normalization every variable term sits on the left and the right
//! side is a single number, one row per dimension key of the aligned sides.

use std::fmt;

use crate::expr::core::{Expression, Term};
use crate::expr::error::ExprError;
use crate::expr::operand::Operand;
use crate::index::DimensionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonSense {
    Le,
    Ge,
    Eq,
}

impl ComparisonSense {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonSense::Le => "le",
            ComparisonSense::Ge => "ge",
            ComparisonSense::Eq => "eq",
        }
    }

    /// Operator as written in LP text.
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonSense::Le => "<=",
            ComparisonSense::Ge => ">=",
            ComparisonSense::Eq => "=",
        }
    }
}

impl fmt::Display for ComparisonSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One normalized row: `terms <sense> rhs` at `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRow {
    pub key: DimensionKey,
    pub terms: Vec<Term>,
    pub rhs: f64,
}

/// A comparison between two expressions, normalized but not yet named.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintExpr {
    sense: ComparisonSense,
    rows: Vec<ConstraintRow>,
}

/// A named constraint ready to be appended to a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub key: DimensionKey,
    pub terms: Vec<Term>,
    pub sense: ComparisonSense,
    pub rhs: f64,
}

impl ConstraintExpr {
    /// Align both sides and normalize each resulting row.
    ///
    /// Fails with `EmptyConstraint` when a row ends up without variables.
    pub fn build(lhs: &Expression, sense: ComparisonSense, rhs: Operand) -> Result<Self, ExprError> {
        let diff = lhs.sub(rhs)?;
        let mut rows = Vec::with_capacity(diff.len());
        for (key, terms) in diff.rows() {
            let variables: Vec<Term> = terms.iter().filter(|t| !t.is_constant()).copied().collect();
            if variables.is_empty() {
                return Err(ExprError::EmptyConstraint {
                    key: key.to_string(),
                });
            }
            let constant: f64 = terms.iter().filter(|t| t.is_constant()).map(|t| t.coefficient).sum();
            let rhs = if constant == 0.0 { 0.0 } else { -constant };
            rows.push(ConstraintRow {
                key,
                terms: variables,
                rhs,
            });
        }
        Ok(Self { sense, rows })
    }

    pub fn sense(&self) -> ComparisonSense {
        self.sense
    }

    pub fn rows(&self) -> &[ConstraintRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Name each row by substituting its key into `template`.
    pub fn named(self, template: &str) -> Vec<Constraint> {
        let sense = self.sense;
        self.rows
            .into_iter()
            .map(|row| Constraint {
                name: row.key.render(template),
                key: row.key,
                terms: row.terms,
                sense,
                rhs: row.rhs,
            })
            .collect()
    }
}

impl Expression {
    pub fn compare(&self, other: impl Into<Operand>, sense: ComparisonSense) -> Result<ConstraintExpr, ExprError> {
        ConstraintExpr::build(self, sense, other.into())
    }

    pub fn le(&self, other: impl Into<Operand>) -> Result<ConstraintExpr, ExprError> {
        self.compare(other, ComparisonSense::Le)
    }

    pub fn ge(&self, other: impl Into<Operand>) -> Result<ConstraintExpr, ExprError> {
        self.compare(other, ComparisonSense::Ge)
    }

    pub fn equals(&self, other: impl Into<Operand>) -> Result<ConstraintExpr, ExprError> {
        self.compare(other, ComparisonSense::Eq)
    }
}
