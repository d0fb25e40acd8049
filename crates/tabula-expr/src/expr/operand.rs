use crate::expr::core::Expression;
use crate::expr::error::ExprError;
use crate::ids::VariableId;
use crate::table::CoefficientTable;

/// Anything that can stand on either side of an arithmetic operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Constant(f64),
    Variable(VariableId),
    Table(CoefficientTable),
    Expr(Expression),
}

impl Operand {
    /// Lift the operand into an expression.
    ///
    /// Fails only for tables whose repeated keys disagree.
    pub fn into_expression(self) -> Result<Expression, ExprError> {
        match self {
            Operand::Constant(value) => Ok(Expression::constant(value)),
            Operand::Variable(id) => Ok(Expression::variable(id)),
            Operand::Table(table) => table.to_expression(),
            Operand::Expr(expr) => Ok(expr),
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Constant(value)
    }
}

impl From<VariableId> for Operand {
    fn from(id: VariableId) -> Self {
        Operand::Variable(id)
    }
}

impl From<CoefficientTable> for Operand {
    fn from(table: CoefficientTable) -> Self {
        Operand::Table(table)
    }
}

impl From<&CoefficientTable> for Operand {
    fn from(table: &CoefficientTable) -> Self {
        Operand::Table(table.clone())
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Operand::Expr(expr)
    }
}

impl From<&Expression> for Operand {
    fn from(expr: &Expression) -> Self {
        Operand::Expr(expr.clone())
    }
}
