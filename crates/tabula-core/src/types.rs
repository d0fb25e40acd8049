/// Optimization sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Sense {
    /// Keyword opening an LP file.
    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Minimize => "minimize",
            Sense::Maximize => "maximize",
        }
    }
}

/// Variable domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    #[default]
    Continuous,
    Integer,
    Binary,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Continuous => "continuous",
            Domain::Integer => "integer",
            Domain::Binary => "binary",
        }
    }
}

/// Bounds for a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `[-inf, inf]`
    pub fn free() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub(crate) fn is_valid(self) -> bool {
        !self.lower.is_nan() && !self.upper.is_nan() && self.lower <= self.upper
    }
}

impl Default for Bounds {
    /// `[0, inf]`
    fn default() -> Self {
        Self::new(0.0, f64::INFINITY)
    }
}

/// Resolved view of one declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub bounds: Bounds,
    pub domain: Domain,
}

impl Variable {
    /// Bounds as written to the model; binaries are always `[0, 1]`.
    pub fn effective_bounds(&self) -> Bounds {
        match self.domain {
            Domain::Binary => Bounds::new(0.0, 1.0),
            _ => self.bounds,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::{Bounds, Domain, Variable};

    #[test]
    fn default_bounds_are_non_negative() {
        let bounds = Bounds::default();
        assert_eq!(bounds.lower, 0.0);
        assert!(bounds.upper.is_infinite());
    }

    #[test]
    fn binary_overrides_declared_bounds() {
        let var = Variable {
            name: "open[0]".to_string(),
            bounds: Bounds::new(0.0, 8.0),
            domain: Domain::Binary,
        };
        assert_eq!(var.effective_bounds(), Bounds::new(0.0, 1.0));
    }

    #[test]
    fn inverted_or_nan_bounds_are_invalid() {
        assert!(!Bounds::new(3.0, 1.0).is_valid());
        assert!(!Bounds::new(f64::NAN, 1.0).is_valid());
        assert!(Bounds::free().is_valid());
    }
}
