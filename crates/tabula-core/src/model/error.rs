//! Model error types.

use tabula_expr::{ExprError, VariableId};

/// Errors that can occur during model operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Expression or constraint construction failed
    Expr(ExprError),
    /// A variable family or constraint name is already taken
    DuplicateDeclaration { name: String },
    /// Handle does not refer to a family of this registry
    UnknownVariable { name: String },
    /// Invalid variable ID
    InvalidVariableId(VariableId),
    /// The process-wide id space cannot hold another family of this size
    VariableIdsExhausted { requested: usize },
    /// Invalid variable bounds
    InvalidVariableBounds { name: String, lower: f64, upper: f64 },
    /// No objective set
    NoObjective,
    /// Objective already set
    MultipleObjectives,
    /// Mutation attempted after finalize
    ModelFinalized,
    /// Serialization requested before finalize
    NotFinalized,
    /// Writing the LP file failed
    Io { path: String, reason: String },
}

impl ModelError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::Expr(inner) => inner.code(),
            ModelError::DuplicateDeclaration { .. } => "DECLARATION_DUPLICATE",
            ModelError::UnknownVariable { .. } => "VARIABLE_UNKNOWN",
            ModelError::InvalidVariableId(_) => "VARIABLE_INVALID_ID",
            ModelError::VariableIdsExhausted { .. } => "VARIABLE_IDS_EXHAUSTED",
            ModelError::InvalidVariableBounds { .. } => "VARIABLE_INVALID_BOUNDS",
            ModelError::NoObjective => "OBJECTIVE_MISSING",
            ModelError::MultipleObjectives => "OBJECTIVE_ALREADY_SET",
            ModelError::ModelFinalized => "MODEL_FINALIZED",
            ModelError::NotFinalized => "MODEL_NOT_FINALIZED",
            ModelError::Io { .. } => "LP_WRITE_FAILED",
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Expr(inner) => write!(f, "{inner}"),
            ModelError::DuplicateDeclaration { name } => {
                write!(f, "[{}] '{}' is already declared", self.code(), name)
            }
            ModelError::UnknownVariable { name } => write!(
                f,
                "[{}] Variable family '{}' is not known to this model",
                self.code(),
                name
            ),
            ModelError::InvalidVariableId(id) => write!(
                f,
                "[{}] Variable ID {} does not belong to this model",
                self.code(),
                id.inner()
            ),
            ModelError::VariableIdsExhausted { requested } => write!(
                f,
                "[{}] No ids left for {} more variables",
                self.code(),
                requested
            ),
            ModelError::InvalidVariableBounds { name, lower, upper } => write!(
                f,
                "[{}] Variable bounds invalid for '{}': lower ({}) > upper ({})",
                self.code(),
                name,
                lower,
                upper
            ),
            ModelError::NoObjective => {
                write!(f, "[{}] Model has no objective defined", self.code())
            }
            ModelError::MultipleObjectives => {
                write!(f, "[{}] Model already has an objective", self.code())
            }
            ModelError::ModelFinalized => write!(
                f,
                "[{}] Model is finalized and can no longer be modified",
                self.code()
            ),
            ModelError::NotFinalized => write!(
                f,
                "[{}] Model must be finalized before it is written",
                self.code()
            ),
            ModelError::Io { path, reason } => {
                write!(f, "[{}] Failed to write '{}': {}", self.code(), path, reason)
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Expr(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<ExprError> for ModelError {
    fn from(err: ExprError) -> Self {
        ModelError::Expr(err)
    }
}
