//! Alignment of two keyed row sets for element-wise arithmetic.
//!
//! Dimensions present on only one side broadcast. Dimensions present on both
//! sides join on equality. For one shared partial key, either side may hold
//! several rows as long as the other holds exactly one; several rows on both
//! sides is ambiguous and rejected.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::expr::ExprError;
use crate::index::{DimensionKey, IndexValue};

/// What to do with rows that find no partner on the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Every row must pair (sums, differences, comparisons).
    Strict,
    /// Unpaired rows drop out (products, filters).
    Inner,
}

/// One output row: its key and the source row on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub key: Vec<IndexValue>,
    pub left: usize,
    pub right: usize,
}

/// Result of aligning two row sets.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Left dimensions, then right-only dimensions.
    pub dims: Arc<[String]>,
    pub pairs: Vec<AlignedPair>,
}

/// Align `left` against `right`, producing output keys and row pairings.
pub fn align(
    left_dims: &[String],
    left_keys: &[&[IndexValue]],
    right_dims: &[String],
    right_keys: &[&[IndexValue]],
    mode: JoinMode,
) -> Result<Alignment, ExprError> {
    let mut shared_left = Vec::new();
    let mut shared_right = Vec::new();
    for (l_pos, dim) in left_dims.iter().enumerate() {
        if let Some(r_pos) = right_dims.iter().position(|d| d == dim) {
            shared_left.push(l_pos);
            shared_right.push(r_pos);
        }
    }
    let right_only: Vec<usize> = (0..right_dims.len())
        .filter(|pos| !shared_right.contains(pos))
        .collect();

    let dims: Arc<[String]> = left_dims
        .iter()
        .chain(right_only.iter().map(|&pos| &right_dims[pos]))
        .cloned()
        .collect();
    let shared_names: Vec<String> = shared_left.iter().map(|&p| left_dims[p].clone()).collect();

    // Right rows grouped by shared partial key, in first-occurrence order.
    let mut groups: HashMap<Vec<IndexValue>, Vec<usize>> = HashMap::new();
    let mut group_order: Vec<Vec<IndexValue>> = Vec::new();
    for (r, key) in right_keys.iter().enumerate() {
        let probe = project(key, &shared_right);
        match groups.entry(probe) {
            Entry::Occupied(mut slot) => slot.get_mut().push(r),
            Entry::Vacant(slot) => {
                group_order.push(slot.key().clone());
                slot.insert(vec![r]);
            }
        }
    }

    let mut left_counts: HashMap<Vec<IndexValue>, usize> = HashMap::new();
    if !shared_left.is_empty() {
        for key in left_keys {
            *left_counts.entry(project(key, &shared_left)).or_insert(0) += 1;
        }
    }

    let mut pairs = Vec::new();
    let mut matched: HashSet<Vec<IndexValue>> = HashSet::new();
    for (l, key) in left_keys.iter().enumerate() {
        let probe = project(key, &shared_left);
        let Some(partners) = groups.get(&probe) else {
            if mode == JoinMode::Strict && !shared_left.is_empty() {
                return Err(unmatched(&shared_names, &probe, "left"));
            }
            continue;
        };
        if !shared_left.is_empty() {
            let left_count = left_counts.get(&probe).copied().unwrap_or(0);
            if left_count > 1 && partners.len() > 1 {
                return Err(ExprError::DimensionMismatch {
                    reason: format!(
                        "many-to-many alignment on {} ({} rows against {})",
                        DimensionKey::from_parts(&shared_names, &probe),
                        left_count,
                        partners.len()
                    ),
                });
            }
            matched.insert(probe.clone());
        }
        for &r in partners {
            let mut out = key.to_vec();
            out.extend(right_only.iter().map(|&pos| right_keys[r][pos].clone()));
            pairs.push(AlignedPair {
                key: out,
                left: l,
                right: r,
            });
        }
    }

    if mode == JoinMode::Strict && !shared_left.is_empty() {
        if let Some(orphan) = group_order.iter().find(|probe| !matched.contains(*probe)) {
            return Err(unmatched(&shared_names, orphan, "right"));
        }
    }

    Ok(Alignment { dims, pairs })
}

fn project(key: &[IndexValue], positions: &[usize]) -> Vec<IndexValue> {
    positions.iter().map(|&pos| key[pos].clone()).collect()
}

fn unmatched(shared: &[String], probe: &[IndexValue], side: &str) -> ExprError {
    ExprError::DimensionMismatch {
        reason: format!(
            "{side} operand row {} has no counterpart on the other operand",
            DimensionKey::from_parts(shared, probe)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{JoinMode, align};
    use crate::expr::ExprError;
    use crate::index::IndexValue;

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn keys(rows: &[&[i64]]) -> Vec<Vec<IndexValue>> {
        rows.iter()
            .map(|row| row.iter().map(|v| IndexValue::Int(*v)).collect())
            .collect()
    }

    fn borrow(rows: &[Vec<IndexValue>]) -> Vec<&[IndexValue]> {
        rows.iter().map(Vec::as_slice).collect()
    }

    #[test]
    fn disjoint_dimensions_broadcast_to_cross_product() {
        let left = keys(&[&[0], &[1]]);
        let right = keys(&[&[5], &[6], &[7]]);
        let out = align(
            &dims(&["i"]),
            &borrow(&left),
            &dims(&["j"]),
            &borrow(&right),
            JoinMode::Strict,
        )
        .expect("broadcast");
        assert_eq!(&*out.dims, &["i".to_string(), "j".to_string()]);
        assert_eq!(out.pairs.len(), 6);
    }

    #[test]
    fn shared_dimension_joins_one_to_many() {
        let left = keys(&[&[0, 5], &[0, 6], &[1, 5]]);
        let right = keys(&[&[0], &[1]]);
        let out = align(
            &dims(&["i", "j"]),
            &borrow(&left),
            &dims(&["i"]),
            &borrow(&right),
            JoinMode::Strict,
        )
        .expect("one-to-many");
        let rights: Vec<usize> = out.pairs.iter().map(|p| p.right).collect();
        assert_eq!(rights, vec![0, 0, 1]);
    }

    #[test]
    fn many_to_many_is_rejected() {
        let left = keys(&[&[0, 5], &[0, 6]]);
        let right = keys(&[&[0, 8], &[0, 9]]);
        let result = align(
            &dims(&["i", "j"]),
            &borrow(&left),
            &dims(&["i", "k"]),
            &borrow(&right),
            JoinMode::Strict,
        );
        assert!(matches!(result, Err(ExprError::DimensionMismatch { .. })));
    }

    #[test]
    fn strict_rejects_unmatched_rows_on_either_side() {
        let left = keys(&[&[0], &[1]]);
        let right = keys(&[&[0]]);
        let forward = align(
            &dims(&["i"]),
            &borrow(&left),
            &dims(&["i"]),
            &borrow(&right),
            JoinMode::Strict,
        );
        assert!(forward.is_err());

        let backward = align(
            &dims(&["i"]),
            &borrow(&right),
            &dims(&["i"]),
            &borrow(&left),
            JoinMode::Strict,
        );
        assert!(backward.is_err());
    }

    #[test]
    fn inner_drops_unmatched_rows() {
        let left = keys(&[&[0], &[1]]);
        let right = keys(&[&[1]]);
        let out = align(
            &dims(&["i"]),
            &borrow(&left),
            &dims(&["i"]),
            &borrow(&right),
            JoinMode::Inner,
        )
        .expect("inner join");
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].left, 1);
    }
}
