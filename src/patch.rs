//! Source patching
//!
//! Rewrites numeric declarations in the simulator's Java sources from a
//! suggestion. Routing is declared once in [`ROUTES`]; the substitution
//! strategy sits behind [`ParameterInjector`] so the regex matching can be
//! swapped without touching the loop.
//!
//! Error asymmetry, deliberately kept: a missing value is logged and
//! skipped, while a value that cannot be converted to the routed numeric
//! type, a missing target file, or any I/O failure aborts the whole run.

use crate::llm::Suggestion;
use crate::report::TuningLog;
use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Numeric type of a routed declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Java `double` declaration (probabilities).
    Float,
    /// Java `int` declaration (plant rates).
    Integer,
}

/// One tunable attribute: where it lives and what it looks like.
#[derive(Debug, Clone, Copy)]
pub struct AttributeRoute {
    /// Key as it appears in the model's JSON reply.
    pub attribute: &'static str,
    /// Target source file, relative to the simulation directory.
    pub file: &'static str,
    /// Java variable name inside the declaration.
    pub variable: &'static str,
    pub kind: ValueKind,
}

const fn route(
    attribute: &'static str,
    file: &'static str,
    variable: &'static str,
    kind: ValueKind,
) -> AttributeRoute {
    AttributeRoute {
        attribute,
        file,
        variable,
        kind,
    }
}

/// Every attribute the tuner writes back to disk. Attributes the model is
/// asked about but which have no route here are context only.
pub const ROUTES: [AttributeRoute; 14] = [
    route("WOLF_CREATION_PROBABILITY", "Simulator.java", "WOLF_CREATION_PROBABILITY", ValueKind::Float),
    route("BOBCAT_CREATION_PROBABILITY", "Simulator.java", "BOBCAT_CREATION_PROBABILITY", ValueKind::Float),
    route("SQUIRREL_CREATION_PROBABILITY", "Simulator.java", "SQUIRREL_CREATION_PROBABILITY", ValueKind::Float),
    route("GROUSE_CREATION_PROBABILITY", "Simulator.java", "GROUSE_CREATION_PROBABILITY", ValueKind::Float),
    route("SEEDS_CREATION_PROBABILITY", "Simulator.java", "SEEDS_CREATION_PROBABILITY", ValueKind::Float),
    route("BERRIES_CREATION_PROBABILITY", "Simulator.java", "BERRIES_CREATION_PROBABILITY", ValueKind::Float),
    route("WOLF_BREEDING_PROBABILITY", "Wolf.java", "BREEDING_PROBABILITY", ValueKind::Float),
    route("BOBCAT_BREEDING_PROBABILITY", "Bobcat.java", "BREEDING_PROBABILITY", ValueKind::Float),
    route("SQUIRREL_BREEDING_PROBABILITY", "Squirrel.java", "BREEDING_PROBABILITY", ValueKind::Float),
    route("GROUSE_BREEDING_PROBABILITY", "Grouse.java", "BREEDING_PROBABILITY", ValueKind::Float),
    route("SEEDS_GROWTH_RATE", "Seeds.java", "GROWTH_RATE", ValueKind::Integer),
    route("SEEDS_REPRODUCTION_RATE", "Seeds.java", "REPRODUCTION_RATE", ValueKind::Integer),
    route("BERRIES_GROWTH_RATE", "Berries.java", "GROWTH_RATE", ValueKind::Integer),
    route("BERRIES_REPRODUCTION_RATE", "Berries.java", "REPRODUCTION_RATE", ValueKind::Integer),
];

/// Plant rates that must never reach the simulator as zero (they are used
/// as modulo divisors there).
pub const RATE_FLOOR_ATTRIBUTES: [&str; 4] = [
    "SEEDS_GROWTH_RATE",
    "BERRIES_GROWTH_RATE",
    "SEEDS_REPRODUCTION_RATE",
    "BERRIES_REPRODUCTION_RATE",
];

/// Raise zero plant growth/reproduction rates to 1 before patching. The
/// corrected value is what gets written and retained as previous context.
pub fn apply_rate_floors(suggestion: &mut Suggestion, log: &mut TuningLog) {
    for attribute in RATE_FLOOR_ATTRIBUTES {
        let floored = suggestion
            .attributes
            .get(attribute)
            .is_some_and(|v| v.as_f64() == Some(0.0));
        if floored {
            suggestion
                .attributes
                .insert(attribute.to_string(), Value::from(1));
            log.note(&format!(
                "Warning: model suggested {}=0, corrected to 1.",
                attribute
            ));
        }
    }
}

/// Replaces the declaration for a routed variable inside file content.
pub trait ParameterInjector {
    /// Returns the rewritten content, or `None` when no declaration
    /// matching the route was found.
    fn inject(&self, content: &str, route: &AttributeRoute, value: &str) -> Option<String>;
}

/// Literal-pattern substitution over the exact declaration shapes the
/// simulator sources use. Only the first occurrence is replaced.
pub struct RegexInjector;

impl ParameterInjector for RegexInjector {
    fn inject(&self, content: &str, route: &AttributeRoute, value: &str) -> Option<String> {
        let (java_type, literal) = match route.kind {
            ValueKind::Float => ("double", r"\d+\.\d+"),
            ValueKind::Integer => ("int", r"-?\d+"),
        };
        let pattern = format!(
            r"private static final {} {} = {};",
            java_type, route.variable, literal
        );
        let re = Regex::new(&pattern).expect("declaration pattern");
        if !re.is_match(content) {
            return None;
        }
        let replacement = format!(
            "private static final {} {} = {};",
            java_type, route.variable, value
        );
        Some(re.replace(content, NoExpand(&replacement)).into_owned())
    }
}

/// Render a suggested value as a Java literal of the routed type.
/// `None` means the value cannot be converted.
fn render_value(value: &Value, kind: ValueKind) -> Option<String> {
    match kind {
        ValueKind::Float => as_f64(value).map(format_double),
        ValueKind::Integer => as_f64(value).map(|v| format!("{}", v as i64)),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Keep the literal re-matchable as a `\d+\.\d+` double on later passes.
fn format_double(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Apply every routed attribute in the suggestion to the sources on disk.
///
/// Returns the number of declarations rewritten. Each change or skip is
/// recorded in the tuning log.
pub fn apply_suggestion(
    dir: &Path,
    suggestion: &Suggestion,
    injector: &dyn ParameterInjector,
    log: &mut TuningLog,
) -> Result<usize> {
    log.note("\n--- Attribute Modifications: ---");
    let mut applied = 0;

    for route in &ROUTES {
        let Some(value) = suggestion.attributes.get(route.attribute) else {
            continue;
        };
        if value.is_null() {
            log.note(&format!(
                "Warning: No value provided for attribute '{}'. Skipping.",
                route.attribute
            ));
            continue;
        }

        let Some(rendered) = render_value(value, route.kind) else {
            log.note(&format!(
                "Error: Invalid value '{}' for attribute '{}'. Aborting.",
                value, route.attribute
            ));
            anyhow::bail!(
                "invalid value '{}' for attribute '{}'",
                value,
                route.attribute
            );
        };

        let path = dir.join(route.file);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;

        match injector.inject(&content, route, &rendered) {
            Some(updated) => {
                fs::write(&path, updated)
                    .with_context(|| format!("failed to write source file {}", path.display()))?;
                log.note(&format!(
                    "Updated {} in {} to {}",
                    route.variable, route.file, rendered
                ));
                applied += 1;
            }
            None => {
                log.note(&format!(
                    "Warning: No declaration for {} found in {}. Skipping.",
                    route.variable, route.file
                ));
            }
        }
    }

    log.note("Source files modified successfully.");
    Ok(applied)
}
