//! Casting raw leaves into their declared types.
//!
//! A failed cast is not an error: the raw value comes back as
//! [`CastOutcome::Unchanged`] and validation reports what was expected.

use inlet_value::{EnumValue, Value};

use crate::{Backing, BackingKind, DateParser, EnumDef, Type};

/// Result of casting one value.
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// The value now has the declared type.
    Typed(Value),
    /// The value was left as it came in.
    Unchanged(Value),
}

impl CastOutcome {
    /// Whether the cast succeeded.
    pub fn is_typed(&self) -> bool {
        matches!(self, CastOutcome::Typed(_))
    }

    /// The resulting value, typed or not.
    pub fn into_value(self) -> Value {
        match self {
            CastOutcome::Typed(value) | CastOutcome::Unchanged(value) => value,
        }
    }
}

/// Casts raw values per [`Type`].
#[derive(Clone, Copy)]
pub struct Caster<'a> {
    dates: &'a dyn DateParser,
}

impl<'a> Caster<'a> {
    /// A caster parsing dates with `dates`.
    pub fn new(dates: &'a dyn DateParser) -> Self {
        Self { dates }
    }

    /// Cast `raw` to `ty`.
    pub fn cast(&self, ty: &Type, raw: Value) -> CastOutcome {
        use CastOutcome::{Typed, Unchanged};

        match ty {
            Type::String => match raw {
                Value::String(_) => Typed(raw),
                other => Unchanged(other),
            },
            Type::Boolean => match raw {
                Value::String(ref s) if s == "true" => Typed(Value::Bool(true)),
                Value::String(ref s) if s == "false" => Typed(Value::Bool(false)),
                Value::Bool(_) => Typed(raw),
                other => Unchanged(other),
            },
            Type::Integer => match raw {
                Value::String(ref s) => match parse_integer(s) {
                    Some(n) => Typed(Value::Integer(n)),
                    None => Unchanged(raw),
                },
                Value::Integer(_) => Typed(raw),
                other => Unchanged(other),
            },
            Type::Float => match raw {
                Value::String(ref s) => match parse_number(s) {
                    Some(n) => Typed(Value::Float(n)),
                    None => Unchanged(raw),
                },
                Value::Integer(n) => Typed(Value::Float(n as f64)),
                Value::Float(_) => Typed(raw),
                other => Unchanged(other),
            },
            Type::Date => match raw {
                Value::String(ref s) => match self.dates.parse(s) {
                    Some(date) => Typed(Value::Date(date)),
                    None => Unchanged(raw),
                },
                Value::Date(_) => Typed(raw),
                other => Unchanged(other),
            },
            Type::Enum(def) => match enum_case(def, &raw) {
                Some(case) => Typed(Value::Enum(EnumValue::new(def.name.as_str(), case))),
                None => Unchanged(raw),
            },
            Type::Class(_) => match raw {
                Value::Object(_) => Typed(raw),
                other => Unchanged(other),
            },
            // elements are reported by validation, never coerced
            Type::Array(_) => Unchanged(raw),
            Type::Mixed => Unchanged(raw),
        }
    }
}

/// The case name selected by `raw`, if any.
fn enum_case<'d>(def: &'d EnumDef, raw: &Value) -> Option<&'d str> {
    let case = match (def.backing_kind(), raw) {
        (_, Value::Enum(selected)) if selected.enum_name == def.name => def.case(&selected.case),
        (Some(BackingKind::Int), Value::String(s)) => {
            def.case_by_backing(&Backing::Int(parse_integer(s)?))
        }
        (Some(BackingKind::Int), Value::Integer(n)) => def.case_by_backing(&Backing::Int(*n)),
        (Some(BackingKind::Str), Value::String(s)) => {
            def.case_by_backing(&Backing::Str(s.clone()))
        }
        (None, Value::String(s)) => def.case(s),
        _ => None,
    };
    case.map(|case| case.name.as_str())
}

/// A numeric string: optional sign, digits with an optional fraction, and an
/// optional exponent, surrounded by optional whitespace.
pub fn is_numeric(raw: &str) -> bool {
    parse_number(raw).is_some()
}

fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let plain = raw
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !plain || !raw.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// A numeric string without a decimal point. Exponent forms count when they
/// denote a whole number that fits, so `1e3` is `1000`.
fn parse_integer(raw: &str) -> Option<i64> {
    if raw.contains('.') {
        return None;
    }
    let number = parse_number(raw)?;
    if let Ok(n) = raw.trim().parse() {
        return Some(n);
    }
    let in_range = number >= i64::MIN as f64 && number < i64::MAX as f64;
    (number.is_finite() && number.fract() == 0.0 && in_range).then_some(number as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChronoDateParser;

    fn cast(ty: &Type, raw: &str) -> CastOutcome {
        Caster::new(&ChronoDateParser).cast(ty, Value::from(raw))
    }

    #[test]
    fn booleans_are_exact() {
        assert_eq!(cast(&Type::Boolean, "true"), CastOutcome::Typed(Value::Bool(true)));
        assert_eq!(cast(&Type::Boolean, "false"), CastOutcome::Typed(Value::Bool(false)));
        assert_eq!(cast(&Type::Boolean, "True"), CastOutcome::Unchanged("True".into()));
        assert_eq!(cast(&Type::Boolean, "1"), CastOutcome::Unchanged("1".into()));
    }

    #[test]
    fn integers_have_no_decimal_point() {
        assert_eq!(cast(&Type::Integer, "42"), CastOutcome::Typed(Value::Integer(42)));
        assert_eq!(cast(&Type::Integer, " -7 "), CastOutcome::Typed(Value::Integer(-7)));
        assert!(!cast(&Type::Integer, "4.0").is_typed());
        assert!(!cast(&Type::Integer, "forty").is_typed());
    }

    #[test]
    fn integers_accept_whole_exponent_forms() {
        assert_eq!(cast(&Type::Integer, "1e3"), CastOutcome::Typed(Value::Integer(1000)));
        assert_eq!(cast(&Type::Integer, "-2E2"), CastOutcome::Typed(Value::Integer(-200)));
        assert_eq!(cast(&Type::Integer, "15e-1"), CastOutcome::Unchanged("15e-1".into()));
        assert_eq!(cast(&Type::Integer, "1e30"), CastOutcome::Unchanged("1e30".into()));
        assert_eq!(cast(&Type::Integer, "1e999"), CastOutcome::Unchanged("1e999".into()));
    }

    #[test]
    fn floats_must_be_numeric() {
        assert_eq!(cast(&Type::Float, "9.99"), CastOutcome::Typed(Value::Float(9.99)));
        assert_eq!(cast(&Type::Float, "1e3"), CastOutcome::Typed(Value::Float(1000.0)));
        assert_eq!(
            cast(&Type::Float, "9.99.9"),
            CastOutcome::Unchanged("9.99.9".into())
        );
        assert!(!cast(&Type::Float, "inf").is_typed());
        assert!(!cast(&Type::Float, "").is_typed());
    }

    #[test]
    fn enums_match_by_backing_or_name() {
        let unit = Type::Enum(EnumDef::unit("Color", ["Red", "Green"]));
        let int = Type::Enum(EnumDef::int_backed("Intensity", [("Low", 10), ("High", 30)]));
        let string = Type::Enum(EnumDef::string_backed(
            "Mime",
            [("Json", "application/json")],
        ));

        assert_eq!(
            cast(&unit, "Green"),
            CastOutcome::Typed(EnumValue::new("Color", "Green").into())
        );
        assert!(!cast(&unit, "green").is_typed());
        assert_eq!(
            cast(&int, "30"),
            CastOutcome::Typed(EnumValue::new("Intensity", "High").into())
        );
        assert!(!cast(&int, "High").is_typed());
        assert_eq!(
            cast(&string, "application/json"),
            CastOutcome::Typed(EnumValue::new("Mime", "Json").into())
        );
        assert!(!cast(&string, "Json").is_typed());
    }

    #[test]
    fn arrays_and_mixed_pass_through() {
        let caster = Caster::new(&ChronoDateParser);
        let raw = Value::from(vec!["1", "2"]);
        assert_eq!(
            caster.cast(&Type::Array(Box::new(Type::Integer)), raw.clone()),
            CastOutcome::Unchanged(raw.clone())
        );
        assert_eq!(caster.cast(&Type::Mixed, raw.clone()), CastOutcome::Unchanged(raw));
    }

    #[test]
    fn json_scalars_are_accepted() {
        let caster = Caster::new(&ChronoDateParser);
        assert_eq!(
            caster.cast(&Type::Float, Value::Integer(3)),
            CastOutcome::Typed(Value::Float(3.0))
        );
        assert_eq!(
            caster.cast(&Type::Boolean, Value::Bool(true)),
            CastOutcome::Typed(Value::Bool(true))
        );
        assert!(!caster.cast(&Type::String, Value::Integer(3)).is_typed());
    }
}
