//! LP writer configuration.

/// How variables and constraints are named in the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMode {
    /// Readable names such as `transport[0,b]`.
    #[default]
    Full,
    /// Compact base-62 identifiers: `x<id>` for variables, `c<index>` for
    /// constraints.
    Short,
}

/// Options for LP serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Naming scheme for rows and columns.
    pub names: NameMode,
    /// Label on the objective line. Defaults to `obj`.
    pub objective_label: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            names: NameMode::Full,
            objective_label: DEFAULT_OBJECTIVE_LABEL.to_string(),
        }
    }
}

const DEFAULT_OBJECTIVE_LABEL: &str = "obj";

impl WriteOptions {
    /// Create options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the naming scheme.
    pub fn with_names(mut self, names: NameMode) -> Self {
        self.names = names;
        self
    }

    /// Set the objective label.
    pub fn with_objective_label(mut self, label: impl Into<String>) -> Self {
        self.objective_label = label.into();
        self
    }

    /// Check if every option is at its default.
    pub fn is_default(&self) -> bool {
        self.names == NameMode::Full && self.objective_label == DEFAULT_OBJECTIVE_LABEL
    }
}
