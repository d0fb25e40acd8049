//! Expression construction errors.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Two operands cannot be aligned without ambiguity.
    DimensionMismatch { reason: String },
    /// The operation would produce a non-linear term.
    NonLinearOperation { reason: String },
    /// A comparison normalizes to no variable terms for this key.
    EmptyConstraint { key: String },
}

impl ExprError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ExprError::DimensionMismatch { .. } => "EXPR_DIMENSION_MISMATCH",
            ExprError::NonLinearOperation { .. } => "EXPR_NON_LINEAR",
            ExprError::EmptyConstraint { .. } => "CONSTRAINT_EMPTY",
        }
    }
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprError::DimensionMismatch { reason } => {
                write!(f, "[{}] Dimension mismatch: {}", self.code(), reason)
            }
            ExprError::NonLinearOperation { reason } => {
                write!(f, "[{}] Non-linear operation: {}", self.code(), reason)
            }
            ExprError::EmptyConstraint { key } => write!(
                f,
                "[{}] Constraint at {} has no variable terms",
                self.code(),
                key
            ),
        }
    }
}

impl std::error::Error for ExprError {}

#[cfg(test)]
mod tests {
    use super::ExprError;

    #[test]
    fn error_code_is_stable() {
        let mismatch = ExprError::DimensionMismatch {
            reason: String::new(),
        };
        assert_eq!(mismatch.code(), "EXPR_DIMENSION_MISMATCH");
        let empty = ExprError::EmptyConstraint {
            key: "[0]".to_string(),
        };
        assert_eq!(empty.code(), "CONSTRAINT_EMPTY");
    }

    #[test]
    fn display_prefixes_error_code() {
        let rendered = ExprError::NonLinearOperation {
            reason: "variable * variable".to_string(),
        }
        .to_string();
        assert!(rendered.starts_with("[EXPR_NON_LINEAR]"));
        assert!(rendered.contains("variable * variable"));
    }
}
