//! Variable registry: declared families, their ids, bounds, and domains.
//!
//! Ids come from one process-wide counter, so an id names exactly one
//! variable of exactly one registry. Each declaration takes a contiguous
//! block, one id per key of the family's index set. Within a registry,
//! variables also have a dense position in declaration order; LP columns and
//! short names follow that position. All state sits behind a single lock so a
//! registry can be shared between threads that declare concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tabula_expr::{DimensionKey, Expression, IndexSet, Operand, VariableId};

use crate::model::ModelError;
use crate::types::{Bounds, Domain, Variable};

static NEXT_VARIABLE_ID: AtomicU32 = AtomicU32::new(0);
static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

/// Reserve `count` consecutive ids from the process-wide counter.
fn allocate_ids(count: usize) -> Option<VariableId> {
    let count = u32::try_from(count).ok()?;
    NEXT_VARIABLE_ID
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| next.checked_add(count))
        .ok()
        .map(VariableId::new)
}

/// One declared family, e.g. `transport[source,destination]`.
#[derive(Debug, Clone)]
pub(crate) struct Family {
    pub(crate) name: String,
    pub(crate) index: IndexSet,
    pub(crate) first: VariableId,
    /// Dense position of `first` within the registry.
    pub(crate) start: usize,
    pub(crate) bounds: Bounds,
    pub(crate) domain: Domain,
}

impl Family {
    fn offset_of(&self, id: VariableId) -> Option<usize> {
        let offset = id.inner().checked_sub(self.first.inner())? as usize;
        (offset < self.index.len()).then_some(offset)
    }

    /// `(dense position, key)` of every variable in the family.
    pub(crate) fn positions_with_keys(&self) -> impl Iterator<Item = (usize, DimensionKey)> + '_ {
        self.index
            .keys()
            .enumerate()
            .map(|(offset, key)| (self.start + offset, key))
    }
}

fn family_of(families: &[Family], id: VariableId) -> Option<&Family> {
    // Families are stored in ascending `first` order.
    let pos = families.partition_point(|family| family.first <= id);
    families.get(pos.checked_sub(1)?)
}

#[derive(Debug, Default)]
struct RegistryState {
    families: Vec<Family>,
    by_name: HashMap<String, usize>,
    rendered: HashSet<String>,
    len: usize,
    frozen: bool,
}

/// Snapshot mapping ids to dense positions, taken once per serialization.
#[derive(Debug, Clone)]
pub(crate) struct ColumnIndex {
    spans: Vec<(VariableId, usize, usize)>,
}

impl ColumnIndex {
    pub(crate) fn position(&self, id: VariableId) -> Option<usize> {
        let pos = self.spans.partition_point(|(first, _, _)| *first <= id);
        let &(first, start, len) = self.spans.get(pos.checked_sub(1)?)?;
        let offset = (id.inner() - first.inner()) as usize;
        (offset < len).then_some(start + offset)
    }
}

/// Reference to a declared family, usable as an arithmetic operand.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableHandle {
    name: String,
    registry: u64,
    family: usize,
    first: VariableId,
    expr: Expression,
}

impl VariableHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The family as an expression: one `1 * x` row per key.
    pub fn expr(&self) -> &Expression {
        &self.expr
    }

    pub fn dims(&self) -> &[String] {
        self.expr.dims()
    }

    pub fn len(&self) -> usize {
        self.expr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    pub fn first_id(&self) -> VariableId {
        self.first
    }

    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.expr.variables()
    }
}

impl From<&VariableHandle> for Operand {
    fn from(handle: &VariableHandle) -> Self {
        Operand::Expr(handle.expr.clone())
    }
}

impl From<VariableHandle> for Operand {
    fn from(handle: VariableHandle) -> Self {
        Operand::Expr(handle.expr)
    }
}

#[derive(Debug)]
pub struct VariableRegistry {
    id: u64,
    state: RwLock<RegistryState>,
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            state: RwLock::new(RegistryState::default()),
        }
    }
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one variable per key of `index`.
    ///
    /// Bounds of a binary family are ignored; binaries are always `[0, 1]`.
    pub fn declare(
        &self,
        name: &str,
        index: &IndexSet,
        bounds: Bounds,
        domain: Domain,
    ) -> Result<VariableHandle, ModelError> {
        check_bounds(name, bounds, domain)?;

        let mut state = self.write_state();
        if state.frozen {
            return Err(ModelError::ModelFinalized);
        }
        if state.by_name.contains_key(name) {
            return Err(ModelError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }

        let mut rendered = HashSet::with_capacity(index.len());
        for key in index.keys() {
            let column = key.render(name);
            if state.rendered.contains(&column) || rendered.contains(&column) {
                return Err(ModelError::DuplicateDeclaration { name: column });
            }
            rendered.insert(column);
        }

        let first = allocate_ids(index.len()).ok_or(ModelError::VariableIdsExhausted {
            requested: index.len(),
        })?;
        let family = state.families.len();
        let start = state.len;
        state.len += index.len();
        state.rendered.extend(rendered);
        state.by_name.insert(name.to_string(), family);
        state.families.push(Family {
            name: name.to_string(),
            index: index.clone(),
            first,
            start,
            bounds,
            domain,
        });
        drop(state);

        tracing::debug!(
            component = "registry",
            operation = "declare",
            status = "success",
            family = name,
            variables = index.len(),
            first_id = first.inner(),
            domain = domain.as_str(),
            "Declared variable family"
        );

        Ok(VariableHandle {
            name: name.to_string(),
            registry: self.id,
            family,
            first,
            expr: Expression::from_variables(index, first),
        })
    }

    /// Replace the bounds of every variable in a family.
    pub fn set_bounds(&self, handle: &VariableHandle, bounds: Bounds) -> Result<(), ModelError> {
        self.update(handle, |family| {
            check_bounds(&family.name, bounds, family.domain)?;
            family.bounds = bounds;
            Ok(())
        })?;
        tracing::debug!(
            component = "registry",
            operation = "set_bounds",
            status = "success",
            family = handle.name.as_str(),
            lower = bounds.lower,
            upper = bounds.upper,
            "Updated variable bounds"
        );
        Ok(())
    }

    /// Replace the domain of every variable in a family.
    pub fn set_domain(&self, handle: &VariableHandle, domain: Domain) -> Result<(), ModelError> {
        self.update(handle, |family| {
            check_bounds(&family.name, family.bounds, domain)?;
            family.domain = domain;
            Ok(())
        })?;
        tracing::debug!(
            component = "registry",
            operation = "set_domain",
            status = "success",
            family = handle.name.as_str(),
            domain = domain.as_str(),
            "Updated variable domain"
        );
        Ok(())
    }

    /// Reject all further mutation.
    pub fn freeze(&self) {
        self.write_state().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.read_state().frozen
    }

    pub fn num_variables(&self) -> usize {
        self.read_state().len
    }

    pub fn num_families(&self) -> usize {
        self.read_state().families.len()
    }

    /// Whether `id` was declared by this registry.
    pub fn contains(&self, id: VariableId) -> bool {
        let state = self.read_state();
        family_of(&state.families, id).is_some_and(|family| family.offset_of(id).is_some())
    }

    /// Resolved name, bounds, and domain of one variable.
    pub fn variable(&self, id: VariableId) -> Option<Variable> {
        let state = self.read_state();
        let family = family_of(&state.families, id)?;
        let offset = family.offset_of(id)?;
        let key = family.index.key(offset)?;
        Some(Variable {
            name: key.render(&family.name),
            bounds: family.bounds,
            domain: family.domain,
        })
    }

    /// Names of all variables in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.with_families(|families| {
            families
                .iter()
                .flat_map(|family| family.index.keys().map(|key| key.render(&family.name)))
                .collect()
        })
    }

    /// Run `f` over the declared families under a read lock.
    pub(crate) fn with_families<R>(&self, f: impl FnOnce(&[Family]) -> R) -> R {
        f(&self.read_state().families)
    }

    pub(crate) fn column_index(&self) -> ColumnIndex {
        self.with_families(|families| ColumnIndex {
            spans: families
                .iter()
                .map(|family| (family.first, family.start, family.index.len()))
                .collect(),
        })
    }

    fn update(
        &self,
        handle: &VariableHandle,
        apply: impl FnOnce(&mut Family) -> Result<(), ModelError>,
    ) -> Result<(), ModelError> {
        let mut state = self.write_state();
        if state.frozen {
            return Err(ModelError::ModelFinalized);
        }
        if handle.registry != self.id {
            return Err(ModelError::UnknownVariable {
                name: handle.name.clone(),
            });
        }
        match state.families.get_mut(handle.family) {
            Some(family) if family.name == handle.name && family.first == handle.first => apply(family),
            _ => Err(ModelError::UnknownVariable {
                name: handle.name.clone(),
            }),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Binary bounds are fixed at `[0, 1]`, so only other domains are checked.
fn check_bounds(name: &str, bounds: Bounds, domain: Domain) -> Result<(), ModelError> {
    if domain == Domain::Binary || bounds.is_valid() {
        return Ok(());
    }
    Err(ModelError::InvalidVariableBounds {
        name: name.to_string(),
        lower: bounds.lower,
        upper: bounds.upper,
    })
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::collections::HashSet;

    use tabula_expr::{IndexSet, IndexValue};

    use super::VariableRegistry;
    use crate::model::ModelError;
    use crate::types::{Bounds, Domain};

    #[test]
    fn ids_are_consecutive_within_a_declaration() {
        let registry = VariableRegistry::new();
        let a = registry
            .declare("a", &IndexSet::new("i", [0, 1, 2]), Bounds::default(), Domain::Continuous)
            .unwrap();
        let b = registry
            .declare("b", &IndexSet::scalar(), Bounds::default(), Domain::Continuous)
            .unwrap();
        let ids: Vec<u32> = a.ids().map(|id| id.inner()).collect();
        let first = a.first_id().inner();
        assert_eq!(ids, vec![first, first + 1, first + 2]);
        assert!(b.first_id() > a.first_id());
        assert_eq!(registry.num_variables(), 4);
        assert_eq!(registry.names(), vec!["a[0]", "a[1]", "a[2]", "b"]);
    }

    #[test]
    fn ids_are_unique_across_registries() {
        let first = VariableRegistry::new();
        let second = VariableRegistry::new();
        let index = IndexSet::new("i", [0, 1]);
        let x = first
            .declare("x", &index, Bounds::default(), Domain::Continuous)
            .unwrap();
        let y = second
            .declare("y", &index, Bounds::default(), Domain::Continuous)
            .unwrap();
        for id in x.ids() {
            assert!(first.contains(id));
            assert!(!second.contains(id));
            assert!(second.variable(id).is_none());
        }
        assert!(y.ids().all(|id| second.contains(id) && !first.contains(id)));
    }

    #[test]
    fn column_index_maps_ids_to_declaration_positions() {
        let registry = VariableRegistry::new();
        let a = registry
            .declare("a", &IndexSet::new("i", [0, 1]), Bounds::default(), Domain::Continuous)
            .unwrap();
        let b = registry
            .declare("b", &IndexSet::scalar(), Bounds::default(), Domain::Continuous)
            .unwrap();
        let columns = registry.column_index();
        let positions: Vec<_> = a.ids().chain(b.ids()).map(|id| columns.position(id)).collect();
        assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);

        let foreign = VariableRegistry::new()
            .declare("c", &IndexSet::scalar(), Bounds::default(), Domain::Continuous)
            .unwrap();
        assert_eq!(columns.position(foreign.first_id()), None);
    }

    #[test]
    fn duplicate_family_name_is_rejected() {
        let registry = VariableRegistry::new();
        registry
            .declare("x", &IndexSet::scalar(), Bounds::default(), Domain::Continuous)
            .unwrap();
        let result = registry.declare("x", &IndexSet::scalar(), Bounds::default(), Domain::Integer);
        assert_eq!(
            result,
            Err(ModelError::DuplicateDeclaration {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn stale_handle_is_unknown() {
        let first = VariableRegistry::new();
        let other = VariableRegistry::new();
        let handle = first
            .declare("x", &IndexSet::new("i", [0]), Bounds::default(), Domain::Continuous)
            .unwrap();
        let result = other.set_domain(&handle, Domain::Binary);
        assert!(matches!(result, Err(ModelError::UnknownVariable { .. })));
    }

    #[test]
    fn same_shaped_family_in_other_registry_rejects_handle() {
        let first = VariableRegistry::new();
        let other = VariableRegistry::new();
        let index = IndexSet::new("i", [0, 1]);
        let handle = first
            .declare("x", &index, Bounds::default(), Domain::Continuous)
            .unwrap();
        other
            .declare("x", &index, Bounds::default(), Domain::Continuous)
            .unwrap();
        assert_eq!(
            other.set_bounds(&handle, Bounds::new(0.0, 3.0)),
            Err(ModelError::UnknownVariable {
                name: "x".to_string()
            })
        );
        assert!(matches!(
            other.set_domain(&handle, Domain::Integer),
            Err(ModelError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn set_bounds_and_domain_apply_to_whole_family() {
        let registry = VariableRegistry::new();
        let handle = registry
            .declare("y", &IndexSet::new("i", ["a", "b"]), Bounds::default(), Domain::Continuous)
            .unwrap();
        registry.set_bounds(&handle, Bounds::new(-1.0, 4.5)).unwrap();
        registry.set_domain(&handle, Domain::Integer).unwrap();
        let second = handle.ids().nth(1).expect("two keys");
        let var = registry.variable(second).expect("declared");
        assert_eq!(var.name, "y[b]");
        assert_eq!(var.bounds, Bounds::new(-1.0, 4.5));
        assert_eq!(var.domain, Domain::Integer);
    }

    #[test]
    fn colliding_rendered_names_are_rejected() {
        let registry = VariableRegistry::new();
        let index = IndexSet::from_rows(
            ["i"],
            vec![vec![IndexValue::Int(1)], vec![IndexValue::Str("1".to_string())]],
        )
        .unwrap();
        assert_eq!(index.len(), 2);
        let result = registry.declare("x", &index, Bounds::default(), Domain::Continuous);
        assert_eq!(
            result,
            Err(ModelError::DuplicateDeclaration {
                name: "x[1]".to_string()
            })
        );
        assert_eq!(registry.num_variables(), 0);

        registry
            .declare("y", &IndexSet::new("i", [0]), Bounds::default(), Domain::Continuous)
            .unwrap();
        let clash = registry.declare("y[0]", &IndexSet::scalar(), Bounds::default(), Domain::Continuous);
        assert!(matches!(clash, Err(ModelError::DuplicateDeclaration { .. })));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let registry = VariableRegistry::new();
        let result = registry.declare("z", &IndexSet::scalar(), Bounds::new(2.0, 1.0), Domain::Continuous);
        assert!(matches!(result, Err(ModelError::InvalidVariableBounds { .. })));
        assert_eq!(registry.num_variables(), 0);
    }

    #[test]
    fn binary_bounds_are_ignored() {
        let registry = VariableRegistry::new();
        let handle = registry
            .declare("b", &IndexSet::scalar(), Bounds::new(2.0, 1.0), Domain::Binary)
            .unwrap();
        registry.set_bounds(&handle, Bounds::new(5.0, -5.0)).unwrap();
        let var = registry.variable(handle.first_id()).expect("declared");
        assert_eq!(var.effective_bounds(), Bounds::new(0.0, 1.0));

        // leaving the binary domain brings the stored bounds back into force
        let result = registry.set_domain(&handle, Domain::Continuous);
        assert!(matches!(result, Err(ModelError::InvalidVariableBounds { .. })));
        registry.set_bounds(&handle, Bounds::new(0.0, 2.0)).unwrap();
        registry.set_domain(&handle, Domain::Continuous).unwrap();
    }

    #[test]
    fn frozen_registry_rejects_declarations() {
        let registry = VariableRegistry::new();
        registry.freeze();
        let result = registry.declare("x", &IndexSet::scalar(), Bounds::default(), Domain::Continuous);
        assert_eq!(result, Err(ModelError::ModelFinalized));
    }

    #[test]
    fn concurrent_declarations_receive_disjoint_ids() {
        let registry = VariableRegistry::new();
        let index = IndexSet::new("i", 0..25_i64);
        let handles: Vec<_> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|worker| {
                    let registry = &registry;
                    let index = &index;
                    scope.spawn(move || {
                        registry
                            .declare(&format!("v{worker}"), index, Bounds::default(), Domain::Continuous)
                            .unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let mut seen = HashSet::new();
        for handle in &handles {
            for id in handle.ids() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 200);
        assert_eq!(registry.num_variables(), 200);
    }
}
