//! The closed set of value-type descriptors.
//!
//! A [`Type`] only describes a value. Casting and rule derivation dispatch on
//! it from the outside with exhaustive `match`es, so adding a variant is a
//! compile error everywhere a consumer forgot to handle it.

use std::fmt;
use std::sync::Arc;

use crate::ClassSchema;

/// Declared type of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Text, never fails to cast.
    String,
    /// Whole number without a decimal point.
    Integer,
    /// Any numeric value.
    Float,
    /// Exactly `"true"` or `"false"`.
    Boolean,
    /// Point in time, parsed by a [`DateParser`](crate::DateParser).
    Date,
    /// One of the cases of an enum.
    Enum(EnumDef),
    /// List of elements of the given type. Elements are not cast.
    Array(Box<Type>),
    /// Nested object with its own schema.
    Class(Arc<ClassSchema>),
    /// Untyped passthrough.
    Mixed,
}

impl Type {
    /// Short human-readable name, used in logs and errors.
    pub fn name(&self) -> &str {
        match self {
            Type::String => "string",
            Type::Integer => "integer",
            Type::Float => "float",
            Type::Boolean => "boolean",
            Type::Date => "date",
            Type::Enum(def) => def.name.as_str(),
            Type::Array(_) => "array",
            Type::Class(schema) => schema.class(),
            Type::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Array(element) => write!(f, "array<{element}>"),
            other => f.write_str(other.name()),
        }
    }
}

/// The backing value of an enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Backing {
    /// Integer-backed case.
    Int(i64),
    /// String-backed case.
    Str(String),
}

impl fmt::Display for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backing::Int(n) => write!(f, "{n}"),
            Backing::Str(s) => f.write_str(s),
        }
    }
}

/// Kind of backing value shared by every case of a backed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackingKind {
    /// Cases are backed by integers.
    Int,
    /// Cases are backed by strings.
    Str,
}

/// One case of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumCase {
    /// Case name.
    pub name: String,
    /// Backing value, for backed enums.
    pub backing: Option<Backing>,
}

/// Everything the caster and the rule deriver need to know about an enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumDef {
    /// Enum identifier.
    pub name: String,
    /// Cases in declaration order.
    pub cases: Vec<EnumCase>,
}

impl EnumDef {
    /// An enum whose cases are matched by name.
    pub fn unit<'a>(name: impl Into<String>, cases: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            name: name.into(),
            cases: cases
                .into_iter()
                .map(|case| EnumCase {
                    name: case.to_string(),
                    backing: None,
                })
                .collect(),
        }
    }

    /// An enum whose cases are matched by integer backing value.
    pub fn int_backed<'a>(
        name: impl Into<String>,
        cases: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Self {
        Self {
            name: name.into(),
            cases: cases
                .into_iter()
                .map(|(case, value)| EnumCase {
                    name: case.to_string(),
                    backing: Some(Backing::Int(value)),
                })
                .collect(),
        }
    }

    /// An enum whose cases are matched by string backing value.
    pub fn string_backed<'a>(
        name: impl Into<String>,
        cases: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            name: name.into(),
            cases: cases
                .into_iter()
                .map(|(case, value)| EnumCase {
                    name: case.to_string(),
                    backing: Some(Backing::Str(value.to_string())),
                })
                .collect(),
        }
    }

    /// The backing kind, taken from the first case. `None` for unit enums.
    pub fn backing_kind(&self) -> Option<BackingKind> {
        self.cases.first()?.backing.as_ref().map(|b| match b {
            Backing::Int(_) => BackingKind::Int,
            Backing::Str(_) => BackingKind::Str,
        })
    }

    /// The textual values a raw input may take: backing values for backed
    /// enums, case names otherwise.
    pub fn accepted_values(&self) -> Vec<String> {
        self.cases
            .iter()
            .map(|case| match &case.backing {
                Some(backing) => backing.to_string(),
                None => case.name.clone(),
            })
            .collect()
    }

    /// Find a case by name.
    pub fn case(&self, name: &str) -> Option<&EnumCase> {
        self.cases.iter().find(|case| case.name == name)
    }

    /// Find a case by backing value.
    pub fn case_by_backing(&self, backing: &Backing) -> Option<&EnumCase> {
        self.cases
            .iter()
            .find(|case| case.backing.as_ref() == Some(backing))
    }
}
