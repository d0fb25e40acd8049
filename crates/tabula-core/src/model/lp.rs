//! LP text serialization.
//!
//! Layout: sense keyword, labelled objective, `s.t.` rows, `bounds`, then
//! optional `binary` and `general` sections, closed by `end`. Every ordering
//! follows declaration or append order, so equal models produce equal text.

use std::path::Path;
use std::time::Instant;

use tabula_expr::{Term, VariableId};

use super::Model;
use super::error::ModelError;
use super::format::{base62, format_lp_number, format_signed_constant, format_term};
use crate::config::{NameMode, WriteOptions};
use crate::types::{Bounds, Domain};

struct DomainSections {
    bounds: Vec<String>,
    binary: Vec<String>,
    general: Vec<String>,
}

impl Model {
    /// Render the finalized model as LP text.
    pub fn to_lp_string(&self, options: &WriteOptions) -> Result<String, ModelError> {
        if !self.is_finalized() {
            return Err(ModelError::NotFinalized);
        }
        let objective = self.objective.as_ref().ok_or(ModelError::NoObjective)?;
        let started = Instant::now();
        let names = self.column_names(options.names);
        let columns = self.registry.column_index();
        let column = |id: VariableId| {
            columns
                .position(id)
                .and_then(|pos| names.get(pos))
                .map(String::as_str)
                .ok_or(ModelError::InvalidVariableId(id))
        };

        let mut out = String::new();
        out.push_str(objective.sense.as_str());
        out.push('\n');
        out.push_str(&options.objective_label);
        out.push_str(":\n");
        let mut parts = Vec::with_capacity(objective.terms.len() + 1);
        for &(id, coefficient) in &objective.terms {
            parts.push(format_term(coefficient, column(id)?));
        }
        if objective.constant != 0.0 {
            parts.push(format_signed_constant(objective.constant));
        }
        if parts.is_empty() {
            out.push('0');
        } else {
            out.push_str(&parts.join(" "));
        }
        out.push('\n');

        out.push_str("s.t.\n");
        for (idx, constraint) in self.constraints.iter().enumerate() {
            let row_name = match options.names {
                NameMode::Full => constraint.name.clone(),
                NameMode::Short => format!("c{}", base62(idx as u32)),
            };
            out.push_str(&row_name);
            out.push_str(": ");
            out.push_str(&render_terms(&constraint.terms, &column)?);
            out.push(' ');
            out.push_str(constraint.sense.symbol());
            out.push(' ');
            out.push_str(&format_lp_number(constraint.rhs));
            out.push('\n');
        }

        let sections = self.domain_sections(&names);
        out.push_str("bounds\n");
        for line in &sections.bounds {
            out.push_str(line);
            out.push('\n');
        }
        for (heading, entries) in [("binary", &sections.binary), ("general", &sections.general)] {
            if entries.is_empty() {
                continue;
            }
            out.push_str(heading);
            out.push('\n');
            for name in entries {
                out.push_str(name);
                out.push('\n');
            }
        }
        out.push_str("end\n");

        tracing::debug!(
            component = "lp",
            operation = "serialize",
            status = "success",
            variables = names.len(),
            constraints = self.constraints.len(),
            bytes = out.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Serialized model to LP text"
        );
        Ok(out)
    }

    /// Write the finalized model to an `.lp` file, replacing any existing file.
    pub fn write_lp(&self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<(), ModelError> {
        let path = path.as_ref();
        if path.extension().and_then(|ext| ext.to_str()) != Some("lp") {
            return Err(ModelError::Io {
                path: path.display().to_string(),
                reason: "file must have an .lp extension".to_string(),
            });
        }
        let text = self.to_lp_string(options)?;
        std::fs::write(path, &text).map_err(|err| ModelError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        tracing::debug!(
            component = "lp",
            operation = "write",
            status = "success",
            path = %path.display(),
            bytes = text.len(),
            "Wrote LP file"
        );
        Ok(())
    }

    fn column_names(&self, mode: NameMode) -> Vec<String> {
        match mode {
            NameMode::Full => self.registry.names(),
            NameMode::Short => (0..self.registry.num_variables() as u32)
                .map(|pos| format!("x{}", base62(pos)))
                .collect(),
        }
    }

    fn domain_sections(&self, names: &[String]) -> DomainSections {
        self.registry.with_families(|families| {
            let mut sections = DomainSections {
                bounds: Vec::new(),
                binary: Vec::new(),
                general: Vec::new(),
            };
            for family in families {
                for (pos, _) in family.positions_with_keys() {
                    let Some(name) = names.get(pos) else {
                        continue;
                    };
                    match family.domain {
                        Domain::Binary => sections.binary.push(name.clone()),
                        Domain::Integer => {
                            sections.bounds.push(bounds_line(name, family.bounds));
                            sections.general.push(name.clone());
                        }
                        Domain::Continuous => sections.bounds.push(bounds_line(name, family.bounds)),
                    }
                }
            }
            sections
        })
    }
}

fn render_terms<'a>(
    terms: &[Term],
    column: &impl Fn(VariableId) -> Result<&'a str, ModelError>,
) -> Result<String, ModelError> {
    let mut parts = Vec::with_capacity(terms.len());
    for term in terms {
        if let Some(id) = term.variable {
            parts.push(format_term(term.coefficient, column(id)?));
        }
    }
    Ok(parts.join(" "))
}

fn bounds_line(name: &str, bounds: Bounds) -> String {
    format!(
        "{} <= {name} <= {}",
        format_lp_number(bounds.lower),
        format_lp_number(bounds.upper)
    )
}
