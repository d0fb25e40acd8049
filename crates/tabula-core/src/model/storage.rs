//! Storage access methods for the model.

use tabula_expr::{Constraint, ConstraintId, VariableId};

use super::error::ModelError;
use super::{Model, Objective};
use crate::registry::VariableRegistry;
use crate::types::Variable;

impl Model {
    /// Get the number of variables
    pub fn num_variables(&self) -> usize {
        self.registry.num_variables()
    }

    /// Get the number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Get the number of coefficients across all constraint rows.
    pub fn num_coefficients(&self) -> usize {
        self.constraints.iter().map(|c| c.terms.len()).sum()
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Constraints in append order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Get a constraint by ID.
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.index())
    }

    /// Get a variable by ID.
    pub fn variable(&self, id: VariableId) -> Result<Variable, ModelError> {
        self.registry
            .variable(id)
            .ok_or(ModelError::InvalidVariableId(id))
    }

    /// Get a variable's rendered name, e.g. `transport[0,b]`.
    pub fn variable_name(&self, id: VariableId) -> Result<String, ModelError> {
        self.variable(id).map(|var| var.name)
    }
}
