use tabula_expr::{CoefficientTable, IndexSet};

use super::*;
use crate::registry::VariableHandle;
use crate::types::{Bounds, Domain};

/// Handles of the small mixed model built by [`small_model`].
pub(super) struct SmallModel {
    pub(super) model: Model,
    pub(super) x: VariableHandle,
    pub(super) y: VariableHandle,
    pub(super) z: VariableHandle,
}

/// `x[i]` continuous over `i in {0,1}`, `y` binary, `z` integer in `[0, 10]`;
/// minimize `2 x[0] + x[1] + y` subject to `cap[i]: x[i] - 5 y <= 0` and
/// `total: x[0] + x[1] + z >= 3`.
pub(super) fn small_model() -> SmallModel {
    let mut model = Model::new();
    let x = model
        .add_variables("x", &IndexSet::new("i", [0, 1]), Bounds::default(), Domain::Continuous)
        .unwrap();
    let y = model.add_binary("y", &IndexSet::scalar()).unwrap();
    let z = model
        .add_variable("z", Bounds::new(0.0, 10.0), Domain::Integer)
        .unwrap();

    let cost = CoefficientTable::from_pairs("i", [(0, 2.0), (1, 1.0)]);
    let objective = x.expr().mul(&cost).unwrap().sum().add(y.expr()).unwrap();
    model.minimize(objective).unwrap();

    let cap = x.expr().sub(y.expr().scale(5.0)).unwrap().le(0.0).unwrap();
    model.add_constraint("cap", cap).unwrap();
    let total = x.expr().sum().add(z.expr()).unwrap().ge(3.0).unwrap();
    model.add_constraint("total", total).unwrap();

    SmallModel { model, x, y, z }
}
