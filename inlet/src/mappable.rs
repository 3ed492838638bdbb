//! The traits a class implements to take part in mapping, and the values
//! handed to its construction hooks.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use inlet_value::{FileHandle, Value, ValueType};

use crate::{ClassDecl, EnumDef, Instance};

/// A hand-declared class the mapper can resolve and reconstruct.
///
/// Types deriving `Facet` need none of this. `Mappable` is for types that
/// carry untyped or computed values, or build themselves through hooks.
/// `declare` is the metadata provider: it lists constructor parameters in
/// the order `construct` consumes them, then assignable fields, then
/// class-level constraints.
///
/// ```
/// use inlet::{Arguments, ClassDecl, ConstructError, Mappable, Source};
///
/// struct Search {
///     term: String,
///     page: i64,
/// }
///
/// impl Mappable for Search {
///     const CLASS: &'static str = "Search";
///
///     fn declare(decl: &mut ClassDecl) {
///         decl.param("term", "string").attr(Source::query());
///         decl.param("page", "int").default_value(1i64);
///     }
///
///     fn construct(args: &mut Arguments) -> Result<Self, ConstructError> {
///         Ok(Self {
///             term: args.next_value()?,
///             page: args.next_value()?,
///         })
///     }
/// }
/// ```
pub trait Mappable: Sized + Send + 'static {
    /// Class identifier, also the name other declarations refer to it by.
    const CLASS: &'static str;

    /// Declare members and constraints.
    fn declare(decl: &mut ClassDecl);

    /// Build an instance from the constructor arguments, in declaration order.
    fn construct(args: &mut Arguments) -> Result<Self, ConstructError>;

    /// Assign a declared field after construction.
    fn assign(&mut self, field: &str, value: Arg) -> Result<(), ConstructError> {
        let _ = value;
        Err(ConstructError::new(ConstructErrorKind::UnknownField).within(Self::CLASS, field))
    }
}

/// An enum the mapper can cast raw values into. Usually generated by
/// [`mappable_enum!`](crate::mappable_enum).
pub trait MappableEnum: Sized + Send + 'static {
    /// Enum identifier, also the name declarations refer to it by.
    const ENUM: &'static str;

    /// Cases and backing values.
    fn definition() -> EnumDef;

    /// The case called `case`.
    fn from_case(case: &str) -> Option<Self>;
}

/// Declare an enum together with its [`MappableEnum`] and [`FromValue`]
/// implementations.
///
/// ```
/// inlet::mappable_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum Color { Red, Green, Blue }
/// }
///
/// inlet::mappable_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum Intensity: int { Low = 10, Medium = 20, High = 30 }
/// }
///
/// inlet::mappable_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum Mime: string { Json = "application/json", Text = "text/plain" }
/// }
///
/// use inlet::MappableEnum;
/// assert_eq!(Intensity::definition().accepted_values(), ["10", "20", "30"]);
/// assert_eq!(Color::from_case("Green"), Some(Color::Green));
/// ```
#[macro_export]
macro_rules! mappable_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : int {
            $($(#[$case_meta:meta])* $case:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$case_meta])* $case),+
        }

        impl $crate::MappableEnum for $name {
            const ENUM: &'static str = stringify!($name);

            fn definition() -> $crate::EnumDef {
                $crate::EnumDef::int_backed(stringify!($name), [$((stringify!($case), $value)),+])
            }

            fn from_case(case: &str) -> Option<Self> {
                match case {
                    $(stringify!($case) => Some(Self::$case),)+
                    _ => None,
                }
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(value: $crate::Value) -> Result<Self, $crate::ConstructError> {
                $crate::enum_from_value(value)
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : string {
            $($(#[$case_meta:meta])* $case:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$case_meta])* $case),+
        }

        impl $crate::MappableEnum for $name {
            const ENUM: &'static str = stringify!($name);

            fn definition() -> $crate::EnumDef {
                $crate::EnumDef::string_backed(stringify!($name), [$((stringify!($case), $value)),+])
            }

            fn from_case(case: &str) -> Option<Self> {
                match case {
                    $(stringify!($case) => Some(Self::$case),)+
                    _ => None,
                }
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(value: $crate::Value) -> Result<Self, $crate::ConstructError> {
                $crate::enum_from_value(value)
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$case_meta:meta])* $case:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$case_meta])* $case),+
        }

        impl $crate::MappableEnum for $name {
            const ENUM: &'static str = stringify!($name);

            fn definition() -> $crate::EnumDef {
                $crate::EnumDef::unit(stringify!($name), [$(stringify!($case)),+])
            }

            fn from_case(case: &str) -> Option<Self> {
                match case {
                    $(stringify!($case) => Some(Self::$case),)+
                    _ => None,
                }
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(value: $crate::Value) -> Result<Self, $crate::ConstructError> {
                $crate::enum_from_value(value)
            }
        }
    };
}

#[doc(hidden)]
pub fn enum_from_value<E: MappableEnum>(value: Value) -> Result<E, ConstructError> {
    match value {
        Value::Enum(selected) if selected.enum_name == E::ENUM => E::from_case(&selected.case)
            .ok_or_else(|| {
                ConstructError::new(ConstructErrorKind::UnknownCase {
                    enum_name: selected.enum_name.clone(),
                    case: selected.case.clone(),
                })
            }),
        other => Err(ConstructError::mismatch(E::ENUM, &other)),
    }
}

/// Extract a Rust value from a cast [`Value`].
pub trait FromValue: Sized {
    /// Convert, failing when the value has another shape.
    fn from_value(value: Value) -> Result<Self, ConstructError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(ConstructError::mismatch("string", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::Integer(n) => Ok(n),
            other => Err(ConstructError::mismatch("integer", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::Float(n) => Ok(n),
            Value::Integer(n) => Ok(n as f64),
            other => Err(ConstructError::mismatch("float", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ConstructError::mismatch("bool", &other)),
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::Date(date) => Ok(date),
            other => Err(ConstructError::mismatch("date", &other)),
        }
    }
}

impl FromValue for FileHandle {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::File(file) => Ok(file),
            other => Err(ConstructError::mismatch("file", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ConstructError::mismatch("array", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConstructError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A value handed to a construction hook: either a cast value or a
/// reconstructed nested instance.
pub enum Arg {
    /// A cast (or raw) value.
    Value(Value),
    /// A reconstructed nested class.
    Instance(Instance),
}

impl Arg {
    /// Extract a plain value.
    pub fn into_value<T: FromValue>(self) -> Result<T, ConstructError> {
        match self {
            Arg::Value(value) => T::from_value(value),
            Arg::Instance(_) => Err(ConstructError::new(ConstructErrorKind::UnexpectedInstance)),
        }
    }

    /// Extract a nested instance of `T`.
    pub fn into_instance<T: Mappable>(self) -> Result<T, ConstructError> {
        match self {
            Arg::Instance(instance) => instance.downcast::<T>().map(|b| *b).map_err(|_| {
                ConstructError::new(ConstructErrorKind::NotAnInstance {
                    expected: T::CLASS.to_string(),
                })
            }),
            Arg::Value(value) => Err(ConstructError::mismatch(T::CLASS, &value)),
        }
    }

    /// Extract a nested instance of `T`, or `None` for a null value.
    pub fn into_optional_instance<T: Mappable>(self) -> Result<Option<T>, ConstructError> {
        match self {
            Arg::Value(Value::Null) => Ok(None),
            other => other.into_instance().map(Some),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Arg::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// Constructor arguments, consumed in declaration order.
#[derive(Debug, Default)]
pub struct Arguments {
    queue: VecDeque<(String, Arg)>,
}

impl Arguments {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named argument.
    pub fn push(&mut self, name: impl Into<String>, arg: Arg) {
        self.queue.push_back((name.into(), arg));
    }

    /// Remaining argument count.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether every argument was consumed.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The next argument and its parameter name.
    pub fn next_arg(&mut self) -> Result<(String, Arg), ConstructError> {
        self.queue
            .pop_front()
            .ok_or_else(|| ConstructError::new(ConstructErrorKind::MissingArgument))
    }

    /// The next argument as a plain value.
    pub fn next_value<T: FromValue>(&mut self) -> Result<T, ConstructError> {
        let (name, arg) = self.next_arg()?;
        arg.into_value().map_err(|e| e.at_property(name))
    }

    /// The next argument as a nested instance.
    pub fn next_instance<T: Mappable>(&mut self) -> Result<T, ConstructError> {
        let (name, arg) = self.next_arg()?;
        arg.into_instance().map_err(|e| e.at_property(name))
    }

    /// The next argument as an optional nested instance.
    pub fn next_optional_instance<T: Mappable>(&mut self) -> Result<Option<T>, ConstructError> {
        let (name, arg) = self.next_arg()?;
        arg.into_optional_instance().map_err(|e| e.at_property(name))
    }
}

/// A failure while reconstructing an instance. Reaching one after successful
/// validation means the declarations and the hooks disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructError {
    class: Option<String>,
    property: Option<String>,
    kind: ConstructErrorKind,
}

/// What went wrong in a [`ConstructError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructErrorKind {
    /// No value and no default.
    MissingValue,
    /// The value has the wrong shape.
    Mismatch {
        /// What the hook asked for.
        expected: String,
        /// What it got.
        found: ValueType,
    },
    /// A nested instance of another class.
    NotAnInstance {
        /// Requested class.
        expected: String,
    },
    /// A nested instance where a plain value was asked for.
    UnexpectedInstance,
    /// `assign` was called with a field the class does not know.
    UnknownField,
    /// The enum has no such case.
    UnknownCase {
        /// Enum identifier.
        enum_name: String,
        /// Requested case.
        case: String,
    },
    /// `construct` asked for more arguments than were declared.
    MissingArgument,
    /// An integer that does not fit the field it is written to.
    OutOfRange {
        /// The value.
        value: i64,
        /// The field's type.
        target: String,
    },
    /// A class built by reflection, nested in a class built by hooks.
    Unbuildable {
        /// The nested class.
        class: String,
    },
    /// Building a value through its shape failed.
    Reflect(String),
    /// Raised by a construction hook.
    Custom(String),
}

impl ConstructError {
    /// An error without context.
    pub fn new(kind: ConstructErrorKind) -> Self {
        Self {
            class: None,
            property: None,
            kind,
        }
    }

    /// A custom error raised by a hook.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(ConstructErrorKind::Custom(message.into()))
    }

    pub(crate) fn mismatch(expected: &str, found: &Value) -> Self {
        Self::new(ConstructErrorKind::Mismatch {
            expected: expected.to_string(),
            found: found.value_type(),
        })
    }

    /// Attach class and property context. Context already present is kept,
    /// so the innermost location wins.
    pub fn within(mut self, class: &str, property: &str) -> Self {
        self.class.get_or_insert_with(|| class.to_string());
        self.property.get_or_insert_with(|| property.to_string());
        self
    }

    pub(crate) fn in_class(mut self, class: &str) -> Self {
        self.class.get_or_insert_with(|| class.to_string());
        self
    }

    fn at_property(mut self, property: String) -> Self {
        self.property.get_or_insert(property);
        self
    }

    /// What went wrong.
    pub fn kind(&self) -> &ConstructErrorKind {
        &self.kind
    }

    /// Class being built, when known.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Property being built, when known.
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }
}

impl fmt::Display for ConstructErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructErrorKind::MissingValue => write!(f, "no value and no default"),
            ConstructErrorKind::Mismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ConstructErrorKind::NotAnInstance { expected } => {
                write!(f, "expected an instance of {expected}")
            }
            ConstructErrorKind::UnexpectedInstance => {
                write!(f, "expected a value, found a nested instance")
            }
            ConstructErrorKind::UnknownField => write!(f, "unknown field"),
            ConstructErrorKind::UnknownCase { enum_name, case } => {
                write!(f, "{enum_name} has no case {case}")
            }
            ConstructErrorKind::MissingArgument => write!(f, "not enough constructor arguments"),
            ConstructErrorKind::OutOfRange { value, target } => {
                write!(f, "{value} does not fit in {target}")
            }
            ConstructErrorKind::Unbuildable { class } => {
                write!(f, "{class} derives Facet and can only be nested in Facet types")
            }
            ConstructErrorKind::Reflect(message) => write!(f, "reflection failed: {message}"),
            ConstructErrorKind::Custom(message) => f.write_str(message),
        }
    }
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.class, &self.property) {
            (Some(class), Some(property)) => write!(f, "{class}.{property}: {}", self.kind),
            (Some(class), None) => write!(f, "{class}: {}", self.kind),
            (None, Some(property)) => write!(f, "{property}: {}", self.kind),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl core::error::Error for ConstructError {}

#[cfg(test)]
mod tests {
    use super::*;
    use inlet_value::EnumValue;

    crate::mappable_enum! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Intensity: int { Low = 10, High = 30 }
    }

    #[test]
    fn enums_come_from_enum_values() {
        let value = Value::from(EnumValue::new("Intensity", "High"));
        assert_eq!(Intensity::from_value(value), Ok(Intensity::High));

        let err = Intensity::from_value(Value::from("30")).unwrap_err();
        assert_eq!(err.to_string(), "expected Intensity, found string");
    }

    #[test]
    fn arguments_are_positional() {
        let mut args = Arguments::new();
        args.push("url", Arg::Value("https://x".into()));
        args.push("price", Arg::Value(Value::Float(9.99)));

        assert_eq!(args.next_value::<String>(), Ok("https://x".to_string()));
        assert_eq!(args.next_value::<f64>(), Ok(9.99));
        assert_eq!(
            args.next_value::<i64>().unwrap_err().kind(),
            &ConstructErrorKind::MissingArgument
        );
    }

    #[test]
    fn mismatches_name_the_parameter() {
        let mut args = Arguments::new();
        args.push("count", Arg::Value("seven".into()));
        let err = args.next_value::<i64>().unwrap_err();
        assert_eq!(err.to_string(), "count: expected integer, found string");
        assert_eq!(err.in_class("Page").to_string(), "Page.count: expected integer, found string");
    }

    #[test]
    fn optional_values_accept_null() {
        assert_eq!(Option::<i64>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i64>::from_value(Value::Integer(3)), Ok(Some(3)));
        assert_eq!(
            Vec::<String>::from_value(Value::from(vec!["a", "b"])),
            Ok(vec!["a".to_string(), "b".to_string()])
        );
    }
}
