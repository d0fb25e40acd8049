//! Index values, dimension keys, and index sets.

use std::collections::HashSet;
use std::fmt;

use crate::expr::ExprError;

/// One member of a dimension (e.g. `"hamburger"` in `food`, `3` in `source`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Int(v) => write!(f, "{v}"),
            IndexValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        IndexValue::Int(value)
    }
}

impl From<i32> for IndexValue {
    fn from(value: i32) -> Self {
        IndexValue::Int(i64::from(value))
    }
}

impl From<u32> for IndexValue {
    fn from(value: u32) -> Self {
        IndexValue::Int(i64::from(value))
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        IndexValue::Str(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        IndexValue::Str(value)
    }
}

/// Ordered tuple of `(dimension, value)` pairs identifying one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DimensionKey {
    entries: Vec<(String, IndexValue)>,
}

impl DimensionKey {
    /// Key of a dimension-less row.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I, D, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (D, V)>,
        D: Into<String>,
        V: Into<IndexValue>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(dim, value)| (dim.into(), value.into()))
                .collect(),
        }
    }

    pub(crate) fn from_parts(dims: &[String], values: &[IndexValue]) -> Self {
        Self {
            entries: dims.iter().cloned().zip(values.iter().cloned()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, IndexValue)] {
        &self.entries
    }

    /// Value for a dimension, if the key carries it.
    pub fn get(&self, dim: &str) -> Option<&IndexValue> {
        self.entries
            .iter()
            .find_map(|(name, value)| (name == dim).then_some(value))
    }

    /// True when every dimension present in both keys has the same value.
    pub fn is_compatible(&self, other: &DimensionKey) -> bool {
        self.entries.iter().all(|(dim, value)| {
            other
                .get(dim)
                .is_none_or(|other_value| other_value == value)
        })
    }

    /// Bracketed, comma-joined values: `[a,b]`, or empty when dimension-less.
    pub fn suffix(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let values: Vec<String> = self.entries.iter().map(|(_, v)| v.to_string()).collect();
        format!("[{}]", values.join(","))
    }

    /// Substitute this key into a name template: `base[a,b]`.
    pub fn render(&self, base: &str) -> String {
        format!("{base}{}", self.suffix())
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("[]");
        }
        f.write_str(&self.suffix())
    }
}

/// A set of distinct keys over named dimensions, in production order.
///
/// Used to declare variable families and to filter expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSet {
    dims: Vec<String>,
    rows: Vec<Vec<IndexValue>>,
}

impl IndexSet {
    /// The dimension-less set with exactly one (empty) key.
    pub fn scalar() -> Self {
        Self {
            dims: Vec::new(),
            rows: vec![Vec::new()],
        }
    }

    /// One-dimensional set. Repeated values collapse to their first occurrence.
    pub fn new<D, I, V>(dim: D, values: I) -> Self
    where
        D: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<IndexValue>,
    {
        let mut seen = HashSet::new();
        let rows = values
            .into_iter()
            .map(|value| -> IndexValue { value.into() })
            .filter(|value| seen.insert(value.clone()))
            .map(|value| vec![value])
            .collect();
        Self {
            dims: vec![dim.into()],
            rows,
        }
    }

    /// Sparse set from explicit rows. Duplicate rows collapse.
    pub fn from_rows<I, D>(dims: I, rows: Vec<Vec<IndexValue>>) -> Result<Self, ExprError>
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let dims = validate_dims(dims.into_iter().map(Into::into).collect())?;
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != dims.len() {
                return Err(ExprError::DimensionMismatch {
                    reason: format!(
                        "index row has {} values but {} dimensions are declared",
                        row.len(),
                        dims.len()
                    ),
                });
            }
            if seen.insert(row.clone()) {
                kept.push(row);
            }
        }
        Ok(Self { dims, rows: kept })
    }

    /// Cartesian product of several sets; dimension names must be disjoint.
    pub fn product(sets: &[IndexSet]) -> Result<Self, ExprError> {
        let dims = validate_dims(sets.iter().flat_map(|s| s.dims.iter().cloned()).collect())?;
        let mut rows: Vec<Vec<IndexValue>> = vec![Vec::new()];
        for set in sets {
            let mut next = Vec::with_capacity(rows.len() * set.rows.len());
            for prefix in &rows {
                for row in &set.rows {
                    let mut combined = prefix.clone();
                    combined.extend(row.iter().cloned());
                    next.push(combined);
                }
            }
            rows = next;
        }
        Ok(Self { dims, rows })
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

    pub(crate) fn rows(&self) -> &[Vec<IndexValue>] {
        &self.rows
    }

    /// Key at a production position.
    pub fn key(&self, position: usize) -> Option<DimensionKey> {
        self.rows
            .get(position)
            .map(|row| DimensionKey::from_parts(&self.dims, row))
    }

    pub fn keys(&self) -> impl Iterator<Item = DimensionKey> + '_ {
        self.rows
            .iter()
            .map(|row| DimensionKey::from_parts(&self.dims, row))
    }
}

pub(crate) fn validate_dims(dims: Vec<String>) -> Result<Vec<String>, ExprError> {
    let mut seen = HashSet::new();
    for dim in &dims {
        if !seen.insert(dim.as_str()) {
            return Err(ExprError::DimensionMismatch {
                reason: format!("dimension '{dim}' appears more than once"),
            });
        }
    }
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::{DimensionKey, IndexSet, IndexValue};
    use crate::expr::ExprError;

    #[test]
    fn suffix_preserves_dimension_order() {
        let key = DimensionKey::new([("source", IndexValue::from(0)), ("sink", "b".into())]);
        assert_eq!(key.render("transport"), "transport[0,b]");
        assert_eq!(DimensionKey::empty().render("total"), "total");
    }

    #[test]
    fn compatibility_ignores_one_sided_dimensions() {
        let a = DimensionKey::new([("i", 0), ("j", 1)]);
        let b = DimensionKey::new([("i", 0)]);
        let c = DimensionKey::new([("i", 1), ("k", 4)]);
        assert!(a.is_compatible(&b));
        assert!(b.is_compatible(&a));
        assert!(!a.is_compatible(&c));
    }

    #[test]
    fn new_collapses_repeated_values() {
        let set = IndexSet::new("food", ["milk", "pizza", "milk"]);
        assert_eq!(set.len(), 2);
        let rendered: Vec<String> = set.keys().map(|k| k.suffix()).collect();
        assert_eq!(rendered, vec!["[milk]", "[pizza]"]);
    }

    #[test]
    fn product_expands_in_declaration_order() {
        let set = IndexSet::product(&[IndexSet::new("i", [0, 1]), IndexSet::new("j", ["a", "b"])])
            .expect("disjoint dims");
        let rendered: Vec<String> = set.keys().map(|k| k.suffix()).collect();
        assert_eq!(rendered, vec!["[0,a]", "[0,b]", "[1,a]", "[1,b]"]);
    }

    #[test]
    fn product_rejects_repeated_dimension() {
        let result = IndexSet::product(&[IndexSet::new("i", [0]), IndexSet::new("i", [1])]);
        assert!(matches!(result, Err(ExprError::DimensionMismatch { .. })));
    }

    #[test]
    fn from_rows_checks_arity() {
        let result = IndexSet::from_rows(["i", "j"], vec![vec![IndexValue::from(0)]]);
        assert!(matches!(result, Err(ExprError::DimensionMismatch { .. })));
    }

    #[test]
    fn scalar_has_one_empty_key() {
        let set = IndexSet::scalar();
        assert_eq!(set.len(), 1);
        assert!(set.dims().is_empty());
    }
}
