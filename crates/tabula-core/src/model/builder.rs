//! Model builder methods for declaring variables, setting the objective, and
//! adding constraints.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tabula_expr::{ConstraintExpr, ConstraintId, ExprError, IndexSet, Operand, VariableId};

use crate::model::error::ModelError;
use crate::model::{Model, ModelState, Objective};
use crate::registry::VariableHandle;
use crate::types::{Bounds, Domain, Sense};

impl Model {
    /// Declare a variable family with one variable per key of `index`.
    pub fn add_variables(
        &mut self,
        name: &str,
        index: &IndexSet,
        bounds: Bounds,
        domain: Domain,
    ) -> Result<VariableHandle, ModelError> {
        self.ensure_building()?;
        self.registry.declare(name, index, bounds, domain)
    }

    /// Declare a single, dimension-less variable.
    pub fn add_variable(
        &mut self,
        name: &str,
        bounds: Bounds,
        domain: Domain,
    ) -> Result<VariableHandle, ModelError> {
        self.add_variables(name, &IndexSet::scalar(), bounds, domain)
    }

    /// Declare a binary family.
    pub fn add_binary(&mut self, name: &str, index: &IndexSet) -> Result<VariableHandle, ModelError> {
        self.add_variables(name, index, Bounds::new(0.0, 1.0), Domain::Binary)
    }

    pub fn set_bounds(&mut self, handle: &VariableHandle, bounds: Bounds) -> Result<(), ModelError> {
        self.ensure_building()?;
        self.registry.set_bounds(handle, bounds)
    }

    pub fn set_domain(&mut self, handle: &VariableHandle, domain: Domain) -> Result<(), ModelError> {
        self.ensure_building()?;
        self.registry.set_domain(handle, domain)
    }

    /// Set the objective. It can be set only once.
    ///
    /// The expression must be dimension-less; sum over dimensions first.
    pub fn set_objective(&mut self, sense: Sense, expr: impl Into<Operand>) -> Result<(), ModelError> {
        self.ensure_building()?;
        if self.objective.is_some() {
            return Err(ModelError::MultipleObjectives);
        }
        let started = Instant::now();
        let expr = expr.into().into_expression()?;
        if !expr.is_dimensionless() {
            return Err(ModelError::Expr(ExprError::DimensionMismatch {
                reason: format!(
                    "objective must be dimension-less but is indexed by {:?}; sum it first",
                    expr.dims()
                ),
            }));
        }

        let mut folded: BTreeMap<VariableId, f64> = BTreeMap::new();
        let mut constant = 0.0;
        for (_, terms) in expr.rows() {
            for term in terms {
                match term.variable {
                    Some(id) => {
                        self.ensure_variable_exists(id)?;
                        *folded.entry(id).or_insert(0.0) += term.coefficient;
                    }
                    None => constant += term.coefficient,
                }
            }
        }

        let objective = Objective {
            sense,
            terms: folded.into_iter().collect(),
            constant,
        };
        tracing::debug!(
            component = "model",
            operation = "set_objective",
            status = "success",
            sense = sense.as_str(),
            terms = objective.terms.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Set objective function"
        );
        self.objective = Some(objective);
        Ok(())
    }

    /// Minimize a dimension-less expression.
    pub fn minimize(&mut self, expr: impl Into<Operand>) -> Result<(), ModelError> {
        self.set_objective(Sense::Minimize, expr)
    }

    /// Maximize a dimension-less expression.
    pub fn maximize(&mut self, expr: impl Into<Operand>) -> Result<(), ModelError> {
        self.set_objective(Sense::Maximize, expr)
    }

    /// Append one constraint per row of `constraint`, named `name[k1,k2]`
    /// (or `name` when dimension-less). Returns the new ids in row order.
    pub fn add_constraint(
        &mut self,
        name: &str,
        constraint: ConstraintExpr,
    ) -> Result<Vec<ConstraintId>, ModelError> {
        self.ensure_building()?;
        if self.constraint_families.contains(name) {
            return Err(ModelError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }

        let started = Instant::now();
        let sense = constraint.sense();
        let rows = constraint.named(name);
        let mut batch = HashSet::with_capacity(rows.len());
        for row in &rows {
            if self.constraint_names.contains(&row.name) || !batch.insert(row.name.as_str()) {
                return Err(ModelError::DuplicateDeclaration {
                    name: row.name.clone(),
                });
            }
            for term in &row.terms {
                if let Some(id) = term.variable {
                    self.ensure_variable_exists(id)?;
                }
            }
        }

        let first = self.constraints.len();
        let ids: Vec<ConstraintId> = (first..first + rows.len())
            .map(|idx| ConstraintId::new(idx as u32))
            .collect();
        self.constraint_families.insert(name.to_string());
        self.constraint_names.extend(rows.iter().map(|row| row.name.clone()));
        self.constraints.extend(rows);

        tracing::debug!(
            component = "model",
            operation = "add_constraint",
            status = "success",
            family = name,
            sense = sense.as_str(),
            rows = ids.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Added constraint family"
        );
        Ok(ids)
    }

    /// Freeze the model. Requires an objective; repeated calls are no-ops.
    pub fn finalize(&mut self) -> Result<(), ModelError> {
        if self.state == ModelState::Finalized {
            return Ok(());
        }
        if self.objective.is_none() {
            return Err(ModelError::NoObjective);
        }
        self.registry.freeze();
        self.state = ModelState::Finalized;
        tracing::debug!(
            component = "model",
            operation = "finalize",
            status = "success",
            variables = self.registry.num_variables(),
            constraints = self.constraints.len(),
            "Finalized model"
        );
        Ok(())
    }
}
