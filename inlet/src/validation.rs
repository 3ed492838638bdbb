//! Rule derivation and the evaluator seam.

use std::fmt;

use indexmap::IndexMap;
use inlet_path::SourcePath;
use inlet_value::Object;

use crate::{ClassSchema, Role, Rule, Type};

/// Rules keyed by source path, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleMap(IndexMap<String, Vec<Rule>>);

impl RuleMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `rules` to the entry for `path`.
    pub fn extend_path(&mut self, path: impl Into<String>, rules: impl IntoIterator<Item = Rule>) {
        self.0.entry(path.into()).or_default().extend(rules);
    }

    /// Rules for `path`.
    pub fn get(&self, path: &str) -> Option<&[Rule]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Entries in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.0.iter().map(|(path, rules)| (path.as_str(), rules.as_slice()))
    }

    /// Paths in schema order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no paths.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One line per path: `path: rule|rule`.
impl fmt::Display for RuleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, rules)) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{path}:")?;
            for (j, rule) in rules.iter().enumerate() {
                f.write_str(if j == 0 { " " } else { "|" })?;
                write!(f, "{rule}")?;
            }
        }
        Ok(())
    }
}

/// The rules a schema implies, nested schemas included.
///
/// Each property gets its declared rules, then the rule implied by its type,
/// then `required` when it has no default. Class-level constraints live under
/// the internal `__request` prefix. Arrays also get a `path.*` entry with
/// the element's type rule.
pub fn derive_rules(schema: &ClassSchema) -> RuleMap {
    let mut rules = RuleMap::new();
    derive_into(schema, &mut rules);
    rules
}

fn derive_into(schema: &ClassSchema, map: &mut RuleMap) {
    for property in schema.properties() {
        let path = match property.role {
            Role::ValidationOnly => property.source_path.internal(),
            Role::Constructor | Role::Field => property.source_path.clone(),
        };

        let mut rules = property.extra_rules.clone();
        rules.extend(type_rule(&property.ty));
        if property.is_required() {
            rules.push(Rule::Required);
        }
        map.extend_path(path.to_string(), rules);

        match &property.ty {
            Type::Array(element) => derive_element(&path, element, map),
            Type::Class(nested) => derive_into(nested, map),
            _ => {}
        }
    }
}

fn derive_element(array: &SourcePath, element: &Type, map: &mut RuleMap) {
    let path = array.wildcard();
    if let Some(rule) = type_rule(element) {
        map.extend_path(path.to_string(), [rule]);
    }
    match element {
        Type::Array(inner) => derive_element(&path, inner, map),
        Type::Class(nested) => derive_into(nested, map),
        _ => {}
    }
}

fn type_rule(ty: &Type) -> Option<Rule> {
    match ty {
        Type::String => Some(Rule::String),
        Type::Integer => Some(Rule::Integer),
        Type::Float => Some(Rule::Numeric),
        Type::Boolean => Some(Rule::Boolean),
        Type::Date => Some(Rule::Date),
        Type::Array(_) => Some(Rule::Array),
        Type::Enum(def) => Some(Rule::Enum(def.clone())),
        Type::Class(_) | Type::Mixed => None,
    }
}

/// Violation messages keyed by source path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(IndexMap<String, Vec<String>>);

impl Violations {
    /// No violations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `path`.
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    /// Messages for `path`.
    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Entries in the order they were first recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(path, messages)| (path.as_str(), messages.as_slice()))
    }

    /// Paths with at least one message.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request")?;
        for (i, (path, messages)) in self.0.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{path}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl core::error::Error for Violations {}

/// Checks a flattened data tree against a [`RuleMap`].
pub trait RuleEvaluator: Send + Sync {
    /// Every violation, or `Ok` when the data satisfies all rules.
    fn evaluate(&self, data: &Object, rules: &RuleMap) -> Result<(), Violations>;
}

impl<F> RuleEvaluator for F
where
    F: Fn(&Object, &RuleMap) -> Result<(), Violations> + Send + Sync,
{
    fn evaluate(&self, data: &Object, rules: &RuleMap) -> Result<(), Violations> {
        self(data, rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_maps_render_one_line_per_path() {
        let mut rules = RuleMap::new();
        rules.extend_path("input.price", [Rule::Numeric, Rule::Required]);
        rules.extend_path("input.tags.*", [Rule::String]);
        rules.extend_path("input.extra", []);
        insta::assert_snapshot!(rules.to_string(), @r"
        input.price: numeric|required
        input.tags.*: string
        input.extra:
        ");
    }

    #[test]
    fn violations_group_by_path() {
        let mut violations = Violations::new();
        violations.add("input.price", "must be numeric");
        violations.add("input.name", "is required");
        violations.add("input.price", "must be greater than 0");

        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations.get("input.price"),
            Some(&["must be numeric".to_string(), "must be greater than 0".to_string()][..])
        );
        insta::assert_snapshot!(
            violations.to_string(),
            @"invalid request: input.price: must be numeric, must be greater than 0; input.name: is required"
        );
        assert!(Violations::new().into_result().is_ok());
    }
}
