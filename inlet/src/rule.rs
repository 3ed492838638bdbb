//! Validation rule tokens.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::{Attribute, EnumDef, Metadata, Target};

/// A single validation rule, as handed to a [`RuleEvaluator`](crate::RuleEvaluator).
///
/// Every rule has a stable token form (`required`, `in:a,b`, `gt:9`, ...)
/// available through `Display`. Tokens that are not recognized by
/// [`Rule::parse`] are kept verbatim as [`Rule::Custom`].
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// The value must be present.
    Required,
    /// The value must be a string.
    String,
    /// The value must be an integer.
    Integer,
    /// The value must be numeric.
    Numeric,
    /// The value must be a boolean.
    Boolean,
    /// The value must be a date.
    Date,
    /// The value must be an array.
    Array,
    /// The value must be one of the declared cases of the enum.
    Enum(EnumDef),
    /// The value must be truthy (`true`, `"yes"`, `"on"`, `1`, ...).
    Accepted,
    /// The value must be falsy (`false`, `"no"`, `"off"`, `0`, ...).
    Declined,
    /// The value must be one of the listed strings.
    In(Vec<String>),
    /// Numeric value (or string length) must be greater than the bound.
    Gt(f64),
    /// Numeric value (or string length) must be less than the bound.
    Lt(f64),
    /// Numeric value (or string length) must be at least the bound.
    Min(f64),
    /// Numeric value (or string length) must be at most the bound.
    Max(f64),
    /// Any other rule, kept as its raw token.
    Custom(String),
}

impl Rule {
    /// Parse a rule token. Never fails: unknown tokens become [`Rule::Custom`].
    pub fn parse(token: &str) -> Self {
        let (name, argument) = match token.split_once(':') {
            Some((name, argument)) => (name, Some(argument)),
            None => (token, None),
        };

        let bound = |make: fn(f64) -> Rule| {
            argument
                .and_then(|a| a.trim().parse::<f64>().ok())
                .map(make)
                .unwrap_or_else(|| Rule::Custom(token.to_string()))
        };

        match (name, argument) {
            ("required", None) => Rule::Required,
            ("string", None) => Rule::String,
            ("integer", None) => Rule::Integer,
            ("numeric", None) => Rule::Numeric,
            ("boolean", None) => Rule::Boolean,
            ("date", None) => Rule::Date,
            ("array", None) => Rule::Array,
            ("accepted", None) => Rule::Accepted,
            ("declined", None) => Rule::Declined,
            ("in", Some(values)) => Rule::In(values.split(',').map(str::to_string).collect()),
            ("gt", Some(_)) => bound(Rule::Gt),
            ("lt", Some(_)) => bound(Rule::Lt),
            ("min", Some(_)) => bound(Rule::Min),
            ("max", Some(_)) => bound(Rule::Max),
            _ => Rule::Custom(token.to_string()),
        }
    }

    /// Rules that still apply when the value is absent.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Rule::Required | Rule::Accepted | Rule::Declined)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("required"),
            Rule::String => f.write_str("string"),
            Rule::Integer => f.write_str("integer"),
            Rule::Numeric => f.write_str("numeric"),
            Rule::Boolean => f.write_str("boolean"),
            Rule::Date => f.write_str("date"),
            Rule::Array => f.write_str("array"),
            Rule::Enum(def) => write!(f, "enum:{}", def.name),
            Rule::Accepted => f.write_str("accepted"),
            Rule::Declined => f.write_str("declined"),
            Rule::In(values) => write!(f, "in:{}", values.join(",")),
            Rule::Gt(n) => write!(f, "gt:{n}"),
            Rule::Lt(n) => write!(f, "lt:{n}"),
            Rule::Min(n) => write!(f, "min:{n}"),
            Rule::Max(n) => write!(f, "max:{n}"),
            Rule::Custom(token) => f.write_str(token),
        }
    }
}

impl FromStr for Rule {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Rule::parse(s))
    }
}

impl From<&str> for Rule {
    fn from(token: &str) -> Self {
        Rule::parse(token)
    }
}

/// A rule attached to a member or a class adds itself to the extra rules.
impl Attribute for Rule {
    fn apply(&self, _target: Target, meta: &mut Metadata) {
        meta.push_rule(self.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        for token in [
            "required",
            "numeric",
            "accepted",
            "in:application/json,text/plain",
            "gt:9",
            "max:2.5",
            "regex:/^a+$/",
        ] {
            assert_eq!(Rule::parse(token).to_string(), token);
        }
    }

    #[test]
    fn malformed_bounds_stay_custom() {
        assert_eq!(Rule::parse("gt:nine"), Rule::Custom("gt:nine".to_string()));
        assert_eq!(Rule::parse("required:yes"), Rule::Custom("required:yes".to_string()));
    }

    #[test]
    fn enum_rule_names_the_enum() {
        let rule = Rule::Enum(EnumDef::unit("Color", ["Red"]));
        assert_eq!(rule.to_string(), "enum:Color");
    }
}
