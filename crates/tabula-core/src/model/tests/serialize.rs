use tabula_expr::IndexSet;

use super::support::small_model;
use super::*;
use crate::config::{NameMode, WriteOptions};
use crate::types::{Bounds, Domain};

const SMALL_LP: &str = "\
minimize
obj:
+2 x[0] +x[1] +y
s.t.
cap[0]: +x[0] -5 y <= 0
cap[1]: +x[1] -5 y <= 0
total: +x[0] +x[1] +z >= 3
bounds
0 <= x[0] <= inf
0 <= x[1] <= inf
0 <= z <= 10
binary
y
general
z
end
";

#[test]
fn test_small_model_serializes_exactly() {
    let mut built = small_model();
    built.model.finalize().unwrap();
    let text = built.model.to_lp_string(&WriteOptions::default()).unwrap();
    assert_eq!(text, SMALL_LP);
}

#[test]
fn test_serialization_is_deterministic() {
    let mut built = small_model();
    built.model.finalize().unwrap();
    let options = WriteOptions::default();
    let first = built.model.to_lp_string(&options).unwrap();
    let second = built.model.to_lp_string(&options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_serialize_requires_finalize() {
    let built = small_model();
    assert_eq!(
        built.model.to_lp_string(&WriteOptions::default()),
        Err(ModelError::NotFinalized)
    );
}

#[test]
fn test_short_names_use_base62_ids() {
    let mut built = small_model();
    built.model.finalize().unwrap();
    let options = WriteOptions::new()
        .with_names(NameMode::Short)
        .with_objective_label("cost");
    let text = built.model.to_lp_string(&options).unwrap();
    assert!(text.contains("cost:\n+2 x0 +x1 +x2\n"));
    assert!(text.contains("c0: +x0 -5 x2 <= 0\n"));
    assert!(text.contains("c2: +x0 +x1 +x3 >= 3\n"));
    assert!(text.contains("binary\nx2\ngeneral\nx3\nend\n"));
}

#[test]
fn test_maximize_with_constant_and_free_bounds() {
    let mut model = Model::new();
    let w = model
        .add_variables("w", &IndexSet::new("t", ["a"]), Bounds::free(), Domain::Continuous)
        .unwrap();
    let objective = w.expr().sum().scale(3.0).add_constant(5.0);
    model.maximize(objective).unwrap();
    model.finalize().unwrap();

    let text = model.to_lp_string(&WriteOptions::default()).unwrap();
    assert_eq!(
        text,
        "maximize\nobj:\n+3 w[a] +5\ns.t.\nbounds\n-inf <= w[a] <= inf\nend\n"
    );
}

#[test]
fn test_empty_objective_prints_zero() {
    let mut model = Model::new();
    model
        .add_variable("x", Bounds::default(), Domain::Continuous)
        .unwrap();
    model.minimize(0.0).unwrap();
    model.finalize().unwrap();
    let text = model.to_lp_string(&WriteOptions::default()).unwrap();
    assert!(text.starts_with("minimize\nobj:\n0\ns.t.\n"));
}

#[test]
fn test_write_lp_rejects_other_extensions() {
    let mut built = small_model();
    built.model.finalize().unwrap();
    let result = built
        .model
        .write_lp(std::env::temp_dir().join("model.mps"), &WriteOptions::default());
    assert!(matches!(result, Err(ModelError::Io { .. })));
}

#[test]
fn test_write_lp_replaces_existing_file() {
    let mut built = small_model();
    built.model.finalize().unwrap();
    let path = std::env::temp_dir().join(format!("tabula-core-{}.lp", std::process::id()));
    std::fs::write(&path, "stale").unwrap();

    built.model.write_lp(&path, &WriteOptions::default()).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(written, SMALL_LP);
}
