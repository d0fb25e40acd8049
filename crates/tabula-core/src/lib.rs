//! Tabula core: variable registry, model lifecycle, and LP text output.

pub mod config;
pub mod model;
pub mod registry;
pub mod types;

pub use config::{NameMode, WriteOptions};
pub use model::{Model, ModelError, ModelState, Objective};
pub use registry::{VariableHandle, VariableRegistry};
pub use types::{Bounds, Domain, Sense, Variable};
