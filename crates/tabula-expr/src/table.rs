//! Coefficient tables: keyed numeric data supplied by the data layer.
//!
//! A table is a typed stand-in for a data frame with declared dimension
//! columns and one value column. Rows may repeat a key (raw data often
//! does); the repeat is only resolved when the table enters the algebra.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::expr::{ExprError, Expression, Row, Term};
use crate::index::{DimensionKey, IndexSet, IndexValue, validate_dims};

#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    dims: Vec<String>,
    rows: Vec<(Vec<IndexValue>, f64)>,
}

impl CoefficientTable {
    /// Table over `dims` with explicit rows.
    pub fn from_rows<I, D>(dims: I, rows: Vec<(Vec<IndexValue>, f64)>) -> Result<Self, ExprError>
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let dims = validate_dims(dims.into_iter().map(Into::into).collect())?;
        if let Some((key, _)) = rows.iter().find(|(key, _)| key.len() != dims.len()) {
            return Err(ExprError::DimensionMismatch {
                reason: format!(
                    "table row has {} key values but {} dimensions are declared",
                    key.len(),
                    dims.len()
                ),
            });
        }
        Ok(Self { dims, rows })
    }

    /// One-dimensional table from `(value, coefficient)` pairs.
    pub fn from_pairs<D, I, K>(dim: D, pairs: I) -> Self
    where
        D: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
        K: Into<IndexValue>,
    {
        Self {
            dims: vec![dim.into()],
            rows: pairs
                .into_iter()
                .map(|(key, value)| (vec![key.into()], value))
                .collect(),
        }
    }

    /// Dimension-less table holding a single value.
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            rows: vec![(Vec::new(), value)],
        }
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (DimensionKey, f64)> + '_ {
        self.rows
            .iter()
            .map(|(key, value)| (DimensionKey::from_parts(&self.dims, key), *value))
    }

    /// Distinct keys of the table, in first-occurrence order.
    pub fn index_set(&self) -> Result<IndexSet, ExprError> {
        IndexSet::from_rows(
            self.dims.iter().cloned(),
            self.rows.iter().map(|(key, _)| key.clone()).collect(),
        )
    }

    /// Lift the table into a constant-only expression.
    ///
    /// Identical repeated rows collapse; two different values under one key
    /// cannot be aligned unambiguously and fail with `DimensionMismatch`.
    pub fn to_expression(&self) -> Result<Expression, ExprError> {
        let mut positions: HashMap<&[IndexValue], usize> = HashMap::with_capacity(self.rows.len());
        let mut unique: Vec<(&[IndexValue], f64)> = Vec::with_capacity(self.rows.len());
        for (key, value) in &self.rows {
            match positions.entry(key.as_slice()) {
                Entry::Occupied(slot) => {
                    let existing = unique[*slot.get()].1;
                    if existing.to_bits() != value.to_bits() {
                        return Err(ExprError::DimensionMismatch {
                            reason: format!(
                                "conflicting values {existing} and {value} for key {}",
                                DimensionKey::from_parts(&self.dims, key)
                            ),
                        });
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(unique.len());
                    unique.push((key.as_slice(), *value));
                }
            }
        }

        let rows = unique
            .into_iter()
            .map(|(key, value)| Row::new(key.to_vec(), [Term::constant(value)]))
            .collect();
        Ok(Expression::from_parts(Arc::from(self.dims.clone()), rows))
    }
}
