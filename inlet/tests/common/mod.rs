#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use facet::Facet;
use inlet::{
    Backing, ChronoDateParser, DateParser, EnumDef, FileHandle, MapError, Object, Registry,
    RequestMapper, Rule, RuleMap, Value, Violations, is_numeric,
};

/// A small rule evaluator understanding every built-in rule token.
///
/// Wildcard paths are expanded over the arrays found in the data, so
/// `input.arr.*` reports against `input.arr.0`, `input.arr.1`, ...
pub fn evaluate(data: &Object, rules: &RuleMap) -> Result<(), Violations> {
    let root = Value::Object(data.clone());
    let mut violations = Violations::new();

    for (path, path_rules) in rules.iter() {
        let segments: Vec<&str> = path.split('.').collect();
        let mut targets = Vec::new();
        expand(Some(&root), String::new(), &segments, &mut targets);

        for (concrete, value) in targets {
            match value.filter(|v| !is_blank(v)) {
                None => {
                    if path_rules.contains(&Rule::Required) {
                        violations.add(concrete, "is required");
                    }
                }
                Some(value) => {
                    for rule in path_rules {
                        if let Some(message) = check(rule, value) {
                            violations.add(concrete.clone(), message);
                        }
                    }
                }
            }
        }
    }

    violations.into_result()
}

fn expand<'d>(
    current: Option<&'d Value>,
    prefix: String,
    rest: &[&str],
    out: &mut Vec<(String, Option<&'d Value>)>,
) {
    let join = |segment: &str| {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}.{segment}")
        }
    };

    match rest.split_first() {
        None => out.push((prefix, current)),
        Some((&"*", tail)) => {
            if let Some(Value::Array(items)) = current {
                for (index, item) in items.iter().enumerate() {
                    expand(Some(item), join(&index.to_string()), tail, out);
                }
            }
        }
        Some((segment, tail)) => {
            let child = current.and_then(|v| v.child(*segment));
            expand(child, join(*segment), tail, out);
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check(rule: &Rule, value: &Value) -> Option<String> {
    let ok = match rule {
        Rule::Required | Rule::Custom(_) => true,
        Rule::String => matches!(value, Value::String(_)),
        Rule::Integer => match value {
            Value::Integer(_) => true,
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        Rule::Numeric => match value {
            Value::Integer(_) | Value::Float(_) => true,
            Value::String(s) => is_numeric(s),
            _ => false,
        },
        Rule::Boolean => match value {
            Value::Bool(_) => true,
            Value::Integer(n) => matches!(n, 0 | 1),
            Value::String(s) => matches!(s.as_str(), "0" | "1"),
            _ => false,
        },
        Rule::Date => match value {
            Value::Date(_) => true,
            Value::String(s) => ChronoDateParser.parse(s).is_some(),
            _ => false,
        },
        Rule::Array => matches!(value, Value::Array(_)),
        Rule::Enum(def) => is_case_of(def, value),
        Rule::Accepted => match value {
            Value::Bool(b) => *b,
            Value::Integer(n) => *n == 1,
            Value::String(s) => matches!(s.as_str(), "yes" | "on" | "1" | "true"),
            _ => false,
        },
        Rule::Declined => match value {
            Value::Bool(b) => !*b,
            Value::Integer(n) => *n == 0,
            Value::String(s) => matches!(s.as_str(), "no" | "off" | "0" | "false"),
            _ => false,
        },
        Rule::In(values) => match value {
            Value::String(s) => values.contains(s),
            Value::Integer(n) => values.contains(&n.to_string()),
            _ => false,
        },
        Rule::Gt(bound) => size(value).is_some_and(|n| n > *bound),
        Rule::Lt(bound) => size(value).is_some_and(|n| n < *bound),
        Rule::Min(bound) => size(value).is_some_and(|n| n >= *bound),
        Rule::Max(bound) => size(value).is_some_and(|n| n <= *bound),
    };
    if ok {
        return None;
    }

    Some(match rule {
        Rule::String => "must be a string".to_string(),
        Rule::Integer => "must be an integer".to_string(),
        Rule::Numeric => "must be numeric".to_string(),
        Rule::Boolean => "must be true or false".to_string(),
        Rule::Date => "must be a valid date".to_string(),
        Rule::Array => "must be an array".to_string(),
        Rule::Accepted => "must be accepted".to_string(),
        Rule::Declined => "must be declined".to_string(),
        Rule::Gt(bound) => format!("must be greater than {bound}"),
        Rule::Lt(bound) => format!("must be less than {bound}"),
        Rule::Min(bound) => format!("must be at least {bound}"),
        Rule::Max(bound) => format!("must be at most {bound}"),
        _ => "is invalid".to_string(),
    })
}

fn is_case_of(def: &EnumDef, value: &Value) -> bool {
    match value {
        Value::Enum(selected) => selected.enum_name == def.name,
        Value::String(s) => def.accepted_values().contains(s),
        Value::Integer(n) => def.case_by_backing(&Backing::Int(*n)).is_some(),
        _ => false,
    }
}

fn size(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) if is_numeric(s) => s.trim().parse().ok(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        other => other.as_f64(),
    }
}

/// One `path: message` line per violation.
pub fn render(violations: &Violations) -> String {
    violations
        .iter()
        .flat_map(|(path, messages)| messages.iter().map(move |m| format!("{path}: {m}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The violations of a rejected request.
pub fn violations(err: MapError) -> Violations {
    match err {
        MapError::Validation(violations) => violations,
        other => panic!("expected violations, got {other}"),
    }
}

pub fn mapper(registry: Registry) -> RequestMapper {
    RequestMapper::builder(registry, evaluate).build()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[repr(u8)]
pub enum Color {
    Red,
    Green,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[repr(u8)]
#[facet(inlet::discriminant)]
pub enum Intensity {
    Low = 10,
    Medium = 20,
    High = 30,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[repr(u8)]
pub enum MediaType {
    #[facet(inlet::backing = "application/json")]
    ApplicationJson,
    #[facet(inlet::backing = "multipart/form-data")]
    MultipartFormData,
}

/// Exercises every source kind, computed values and enum flavors at once.
#[derive(Debug, Facet)]
pub struct Order {
    pub url: String,
    pub name: String,
    pub price: f64,
    #[facet(inlet::ajax, inlet::rules = "accepted")]
    pub is_ajax: bool,
    #[facet(inlet::method)]
    pub method: String,
    #[facet(default = String::from("foo"))]
    pub default: String,
    #[facet(inlet::rules = "gt:9")]
    pub quantity: i64,
    pub date: DateTime<FixedOffset>,
    pub flag: bool,
    #[facet(inlet::header = "X-Flag")]
    pub flag_from_header: bool,
    #[facet(inlet::header = "Content-Type")]
    pub content_type: String,
    pub color: Color,
    pub intensity: Intensity,
    pub arr: Vec<i64>,
    pub attachment: FileHandle,
}

pub fn order_registry() -> Registry {
    Registry::new().with_type::<Order>()
}

/// Reads its media type from the `Content-Type` header.
#[derive(Debug, Facet)]
pub struct Upload {
    #[facet(inlet::header = "Content-Type")]
    pub content_type: Option<MediaType>,
}

#[derive(Debug, PartialEq, Facet)]
pub struct Leaf {
    pub floob: String,
}

#[derive(Debug, PartialEq, Facet)]
pub struct Branch {
    pub bar: String,
    pub baz: i64,
    #[facet(inlet::key = "subSubObject")]
    pub leaf: Leaf,
}

#[derive(Debug, PartialEq, Facet)]
pub struct Tree {
    pub foo: String,
    #[facet(inlet::key = "subObject")]
    pub branch: Branch,
}

pub fn tree_registry() -> Registry {
    Registry::new().with_type::<Tree>()
}

/// Only accepted from ajax requests.
#[derive(Debug, Facet)]
#[facet(inlet::ajax)]
pub struct AjaxOnly;

/// Only accepted with a JSON body.
#[derive(Debug, Facet)]
#[facet(inlet::accepts = "application/json")]
pub struct JsonOnly;

#[derive(Debug, PartialEq, Facet)]
pub struct Listing {
    pub url: String,
    pub name: String,
    pub price: f64,
}
