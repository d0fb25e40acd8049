//! Model module for assembling optimization models.
//!
//! This module provides the core [`Model`] type: a variable registry, one
//! objective, and an ordered list of named constraints. A model is built up
//! in the `Building` state and becomes read-only once finalized; only a
//! finalized model is written out.
//!
//! # Module Organization
//!
//! - [`error`]: Model error types
//! - `builder`: Declaring variables, setting the objective, adding constraints
//! - `storage`: Read access to stored rows and variables
//! - `lp`: LP text serialization
//! - `format`: Number and identifier formatting for LP text

mod builder;
pub mod error;
pub mod format;
mod lp;
mod storage;

use std::collections::HashSet;

use tabula_expr::{Constraint, VariableId};

use crate::registry::VariableRegistry;
use crate::types::Sense;

pub use error::ModelError;

/// Lifecycle state of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Building,
    Finalized,
}

impl ModelState {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelState::Building => "building",
            ModelState::Finalized => "finalized",
        }
    }
}

/// Objective function: sense, folded terms in variable-id order, constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    pub terms: Vec<(VariableId, f64)>,
    pub constant: f64,
}

/// A linear or mixed-integer model under construction.
#[derive(Debug)]
pub struct Model {
    pub(crate) registry: VariableRegistry,
    pub(crate) objective: Option<Objective>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) constraint_names: HashSet<String>,
    pub(crate) constraint_families: HashSet<String>,
    pub(crate) state: ModelState,
}

impl Model {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self {
            registry: VariableRegistry::new(),
            objective: None,
            constraints: Vec::new(),
            constraint_names: HashSet::new(),
            constraint_families: HashSet::new(),
            state: ModelState::Building,
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state == ModelState::Finalized
    }

    pub(crate) fn ensure_building(&self) -> Result<(), ModelError> {
        match self.state {
            ModelState::Building => Ok(()),
            ModelState::Finalized => Err(ModelError::ModelFinalized),
        }
    }

    pub(crate) fn ensure_variable_exists(&self, id: VariableId) -> Result<(), ModelError> {
        if self.registry.contains(id) {
            Ok(())
        } else {
            Err(ModelError::InvalidVariableId(id))
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
