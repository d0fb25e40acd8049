//! Operations that change an expression's shape rather than its terms:
//! aggregation over dimensions, shifting along an ordered dimension, and
//! filtering by an index set.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::align::{JoinMode, align};
use crate::expr::core::{Expression, Row, Term};
use crate::expr::error::ExprError;
use crate::index::{IndexSet, IndexValue};

impl Expression {
    /// Aggregate away the named dimensions, summing rows that agree on the
    /// remaining ones.
    pub fn sum_over<I, S>(&self, dims: I) -> Result<Self, ExprError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = Vec::new();
        for dim in dims {
            let dim = dim.as_ref();
            let Some(pos) = self.position(dim) else {
                return Err(ExprError::DimensionMismatch {
                    reason: format!("cannot sum over '{dim}': not a dimension of {:?}", self.dims()),
                });
            };
            removed.push(pos);
        }

        let kept: Vec<usize> = (0..self.dims().len()).filter(|pos| !removed.contains(pos)).collect();
        let dims: Arc<[String]> = kept.iter().map(|&pos| self.dims()[pos].clone()).collect();
        if kept.is_empty() {
            return Ok(self.collapse());
        }

        let mut groups: HashMap<Vec<IndexValue>, usize> = HashMap::new();
        let mut buckets: Vec<(Vec<IndexValue>, Vec<Term>)> = Vec::new();
        for row in self.raw_rows() {
            let key: Vec<IndexValue> = kept.iter().map(|&pos| row.key[pos].clone()).collect();
            match groups.entry(key) {
                Entry::Occupied(slot) => buckets[*slot.get()].1.extend_from_slice(&row.terms),
                Entry::Vacant(slot) => {
                    buckets.push((slot.key().clone(), row.terms.clone()));
                    slot.insert(buckets.len() - 1);
                }
            }
        }

        let rows = buckets
            .into_iter()
            .map(|(key, terms)| Row::new(key, terms))
            .collect();
        Ok(Self::from_parts(dims, rows))
    }

    /// Aggregate over every dimension into a single dimension-less row.
    pub fn sum(&self) -> Self {
        self.collapse()
    }

    /// Shift along an ordered dimension: the row at `t` takes the terms of the
    /// row at the next value of `dim` (in sorted order of the values present).
    ///
    /// With `wrap_around` the last value's successor is the first; without it
    /// the last value has no successor and its row is dropped.
    pub fn next(&self, dim: &str, wrap_around: bool) -> Result<Self, ExprError> {
        let Some(pos) = self.position(dim) else {
            return Err(ExprError::DimensionMismatch {
                reason: format!("cannot shift along '{dim}': not a dimension of {:?}", self.dims()),
            });
        };

        let mut values: Vec<&IndexValue> = self.raw_rows().iter().map(|row| &row.key[pos]).collect();
        values.sort();
        values.dedup();
        let predecessor: HashMap<&IndexValue, &IndexValue> = values
            .iter()
            .enumerate()
            .filter_map(|(k, value)| match k {
                0 if wrap_around => values.last().map(|last| (*value, *last)),
                0 => None,
                _ => Some((*value, values[k - 1])),
            })
            .collect();

        let rows = self
            .raw_rows()
            .iter()
            .filter_map(|row| {
                let target = predecessor.get(&row.key[pos])?;
                let mut key = row.key.clone();
                key[pos] = (*target).clone();
                Some(Row::new(key, row.terms.iter().copied()))
            })
            .collect();
        Ok(Self::from_parts(self.dims_arc(), rows))
    }

    /// Keep only rows whose key matches some key of `index` on the index's
    /// dimensions, which must all belong to this expression.
    pub fn within(&self, index: &IndexSet) -> Result<Self, ExprError> {
        if let Some(missing) = index.dims().iter().find(|dim| self.position(dim).is_none()) {
            return Err(ExprError::DimensionMismatch {
                reason: format!("filter dimension '{missing}' is not a dimension of {:?}", self.dims()),
            });
        }
        let filter_keys: Vec<&[IndexValue]> = index.rows().iter().map(Vec::as_slice).collect();
        let alignment = align(
            self.dims(),
            &self.raw_keys(),
            index.dims(),
            &filter_keys,
            JoinMode::Inner,
        )?;
        let rows = alignment
            .pairs
            .into_iter()
            .map(|pair| Row::new(pair.key, self.raw_rows()[pair.left].terms.iter().copied()))
            .collect();
        Ok(Self::from_parts(alignment.dims, rows))
    }

    fn position(&self, dim: &str) -> Option<usize> {
        self.dims().iter().position(|d| d == dim)
    }

    fn collapse(&self) -> Self {
        let terms = self.raw_rows().iter().flat_map(|row| row.terms.iter().copied());
        Self::from_parts(Arc::from(Vec::new()), vec![Row::new(Vec::new(), terms)])
    }
}
