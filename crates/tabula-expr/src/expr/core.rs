//! Core expression type: keyed rows of folded linear terms.
//!
//! An expression is a table. Every row carries a key over the expression's
//! dimensions and a list of terms; a term without a variable is the row's
//! constant. Within a row there is at most one term per variable (and one
//! constant): duplicates are summed as soon as a row is built.
//!
//! Rows and dimension names sit behind `Arc`, so clones are cheap and an
//! expression can be shared across threads once built.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::align::{JoinMode, align};
use crate::expr::error::ExprError;
use crate::expr::operand::Operand;
use crate::ids::VariableId;
use crate::index::{DimensionKey, IndexSet, IndexValue};

/// One contribution to a row: `coefficient * variable`, or a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub variable: Option<VariableId>,
    pub coefficient: f64,
}

impl Term {
    pub fn new(variable: VariableId, coefficient: f64) -> Self {
        Self {
            variable: Some(variable),
            coefficient,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            variable: None,
            coefficient: value,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.variable.is_none()
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            variable: self.variable,
            coefficient: f(self.coefficient),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub(crate) key: Vec<IndexValue>,
    pub(crate) terms: Vec<Term>,
}

impl Row {
    pub(crate) fn new(key: Vec<IndexValue>, terms: impl IntoIterator<Item = Term>) -> Self {
        Self {
            key,
            terms: fold_terms(terms),
        }
    }

    pub(crate) fn constant(&self) -> f64 {
        self.terms
            .iter()
            .find(|term| term.is_constant())
            .map_or(0.0, |term| term.coefficient)
    }

    pub(crate) fn has_variables(&self) -> bool {
        self.terms.iter().any(|term| !term.is_constant())
    }

    fn mapped(&self, f: impl Fn(f64) -> f64 + Copy) -> Vec<Term> {
        self.terms.iter().map(|term| term.map(f)).collect()
    }
}

/// Sum terms that share a variable (or are both constants), keeping first
/// occurrence order.
///
/// A variable whose coefficient is zero without any non-zero contribution is
/// kept: it was written into the model with a zero coefficient. A zero that
/// results from non-zero contributions cancelling out is dropped, as is any
/// zero constant.
pub(crate) fn fold_terms(terms: impl IntoIterator<Item = Term>) -> Vec<Term> {
    let mut slots: Vec<(Term, bool)> = Vec::new();
    let mut positions: HashMap<Option<VariableId>, usize> = HashMap::new();
    for term in terms {
        let nonzero = term.coefficient != 0.0;
        match positions.entry(term.variable) {
            Entry::Occupied(slot) => {
                let (acc, contributed) = &mut slots[*slot.get()];
                acc.coefficient += term.coefficient;
                *contributed |= nonzero;
            }
            Entry::Vacant(slot) => {
                slot.insert(slots.len());
                slots.push((term, nonzero));
            }
        }
    }
    slots
        .into_iter()
        .filter(|(term, contributed)| {
            term.coefficient != 0.0 || (!term.is_constant() && !*contributed)
        })
        .map(|(term, _)| term)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    dims: Arc<[String]>,
    rows: Arc<[Row]>,
}

impl Expression {
    // ── Constructors ────────────────────────────────────────

    /// Dimension-less expression holding a constant.
    pub fn constant(value: f64) -> Self {
        Self::from_parts(
            Arc::from(Vec::new()),
            vec![Row::new(Vec::new(), [Term::constant(value)])],
        )
    }

    /// Dimension-less zero.
    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// Dimension-less expression `1 * variable`.
    pub fn variable(id: VariableId) -> Self {
        Self::from_parts(
            Arc::from(Vec::new()),
            vec![Row::new(Vec::new(), [Term::new(id, 1.0)])],
        )
    }

    /// One row per index key holding `1 * variable`, with ids assigned
    /// consecutively from `first` in key order.
    pub fn from_variables(index: &IndexSet, first: VariableId) -> Self {
        let rows = index
            .rows()
            .iter()
            .enumerate()
            .map(|(offset, key)| {
                let id = VariableId::new(first.inner() + offset as u32);
                Row::new(key.clone(), [Term::new(id, 1.0)])
            })
            .collect();
        Self::from_parts(Arc::from(index.dims().to_vec()), rows)
    }

    pub(crate) fn from_parts(dims: Arc<[String]>, rows: Vec<Row>) -> Self {
        Self {
            dims,
            rows: Arc::from(rows),
        }
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub(crate) fn dims_arc(&self) -> Arc<[String]> {
        Arc::clone(&self.dims)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_empty()
    }

    /// Total number of terms across all rows.
    pub fn num_terms(&self) -> usize {
        self.rows.iter().map(|row| row.terms.len()).sum()
    }

    pub fn key(&self, row: usize) -> Option<DimensionKey> {
        self.rows
            .get(row)
            .map(|r| DimensionKey::from_parts(&self.dims, &r.key))
    }

    pub fn terms_at(&self, row: usize) -> &[Term] {
        self.rows
            .get(row)
            .map(|r| r.terms.as_slice())
            .unwrap_or_default()
    }

    /// Constant of a row (zero when the row has none).
    pub fn constant_at(&self, row: usize) -> f64 {
        self.rows.get(row).map_or(0.0, Row::constant)
    }

    pub fn rows(&self) -> impl Iterator<Item = (DimensionKey, &[Term])> + '_ {
        self.rows.iter().map(|row| {
            (
                DimensionKey::from_parts(&self.dims, &row.key),
                row.terms.as_slice(),
            )
        })
    }

    /// Every variable referenced, in row then term order (may repeat).
    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.rows
            .iter()
            .flat_map(|row| row.terms.iter().filter_map(|term| term.variable))
    }

    pub(crate) fn raw_rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn raw_keys(&self) -> Vec<&[IndexValue]> {
        self.rows.iter().map(|row| row.key.as_slice()).collect()
    }

    // ── Arithmetic ──────────────────────────────────────────

    /// Sum with another operand, aligning rows by key.
    ///
    /// Shared dimensions must match on both sides; one-sided dimensions
    /// broadcast.
    pub fn add(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        let other = other.into().into_expression()?;
        self.combine(&other, JoinMode::Strict, |left, right| {
            Ok(left.terms.iter().chain(right.terms.iter()).copied().collect())
        })
    }

    pub fn sub(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        let other = other.into().into_expression()?;
        self.add(other.scale(-1.0))
    }

    /// Element-wise product. Rows without a partner drop out, so multiplying
    /// by sparse data restricts the expression to that data's keys.
    pub fn mul(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        let other = other.into().into_expression()?;
        self.combine(&other, JoinMode::Inner, |left, right| {
            match (left.has_variables(), right.has_variables()) {
                (true, true) => Err(ExprError::NonLinearOperation {
                    reason: "product of two expressions that both contain variables".to_string(),
                }),
                (true, false) => {
                    let factor = right.constant();
                    Ok(left.mapped(|c| c * factor))
                }
                (false, _) => {
                    let factor = left.constant();
                    Ok(right.mapped(|c| c * factor))
                }
            }
        })
    }

    /// Divide by a nonzero numeric constant.
    pub fn div(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        match other.into() {
            Operand::Constant(divisor) if divisor != 0.0 && divisor.is_finite() => {
                Ok(self.map_coefficients(|c| c / divisor))
            }
            Operand::Constant(divisor) => Err(ExprError::NonLinearOperation {
                reason: format!("division by {divisor}"),
            }),
            _ => Err(ExprError::NonLinearOperation {
                reason: "division by a non-constant operand".to_string(),
            }),
        }
    }

    /// Scale every term and constant by a factor.
    pub fn scale(&self, by: f64) -> Self {
        self.map_coefficients(|c| c * by)
    }

    /// Add a constant to every row.
    pub fn add_constant(&self, value: f64) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                Row::new(
                    row.key.clone(),
                    row.terms.iter().copied().chain([Term::constant(value)]),
                )
            })
            .collect();
        Self::from_parts(self.dims_arc(), rows)
    }

    fn map_coefficients(&self, f: impl Fn(f64) -> f64 + Copy) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| Row::new(row.key.clone(), row.mapped(f)))
            .collect();
        Self::from_parts(self.dims_arc(), rows)
    }

    fn combine<F>(&self, other: &Expression, mode: JoinMode, mut merge: F) -> Result<Self, ExprError>
    where
        F: FnMut(&Row, &Row) -> Result<Vec<Term>, ExprError>,
    {
        let alignment = align(
            &self.dims,
            &self.raw_keys(),
            &other.dims,
            &other.raw_keys(),
            mode,
        )?;
        let mut rows = Vec::with_capacity(alignment.pairs.len());
        for pair in alignment.pairs {
            let terms = merge(&self.rows[pair.left], &other.rows[pair.right])?;
            rows.push(Row::new(pair.key, terms));
        }
        Ok(Self::from_parts(alignment.dims, rows))
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::zero()
    }
}

// ── Operator overloads (infallible forms only) ──────────────

impl std::ops::Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output {
        self.scale(-1.0)
    }
}

impl std::ops::Neg for &Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output {
        self.scale(-1.0)
    }
}

impl std::ops::Mul<f64> for Expression {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Mul<Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Self::Output {
        rhs.scale(self)
    }
}

impl std::ops::Add<f64> for Expression {
    type Output = Expression;

    fn add(self, rhs: f64) -> Self::Output {
        self.add_constant(rhs)
    }
}

impl std::ops::Sub<f64> for Expression {
    type Output = Expression;

    fn sub(self, rhs: f64) -> Self::Output {
        self.add_constant(-rhs)
    }
}
