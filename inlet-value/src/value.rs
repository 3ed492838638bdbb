//! The [`Value`] enum and its conversions.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use chrono::{DateTime, FixedOffset};

use crate::{FileHandle, Object};

/// The kind of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `Value::Null`
    Null,
    /// `Value::Bool`
    Bool,
    /// `Value::Integer`
    Integer,
    /// `Value::Float`
    Float,
    /// `Value::String`
    String,
    /// `Value::Date`
    Date,
    /// `Value::Enum`
    Enum,
    /// `Value::Array`
    Array,
    /// `Value::Object`
    Object,
    /// `Value::File`
    File,
}

impl ValueType {
    /// Lowercase name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Date => "date",
            ValueType::Enum => "enum",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::File => "file",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected enum case, identified by enum and case name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Identifier of the enum.
    pub enum_name: String,
    /// Name of the selected case.
    pub case: String,
}

impl EnumValue {
    /// Create an enum value.
    pub fn new(enum_name: impl Into<String>, case: impl Into<String>) -> Self {
        Self {
            enum_name: enum_name.into(),
            case: case.into(),
        }
    }
}

/// A raw or cast value living somewhere in the data tree.
///
/// Raw request data only ever contains strings, arrays, objects and file
/// handles (plus whatever scalars a JSON body carries). The other variants
/// appear once the caster has typed a leaf.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    String(String),
    /// Point in time.
    Date(DateTime<FixedOffset>),
    /// Enum case.
    Enum(EnumValue),
    /// Ordered list.
    Array(Vec<Value>),
    /// Ordered map.
    Object(Object),
    /// Opaque uploaded file.
    File(FileHandle),
}

impl Value {
    /// The kind of this value.
    pub const fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Date(_) => ValueType::Date,
            Value::Enum(_) => ValueType::Enum,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
            Value::File(_) => ValueType::File,
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for [`Value::Object`].
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns `true` for [`Value::Array`].
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// The boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The number as a float, if this is an integer or a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The date, if this is one.
    pub const fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    /// The enum case, if this is one.
    pub const fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// The elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The map, if this is an object.
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The map, mutably, if this is an object.
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The file handle, if this is one.
    pub const fn as_file(&self) -> Option<&FileHandle> {
        match self {
            Value::File(file) => Some(file),
            _ => None,
        }
    }

    /// Replace this value with `Null`, returning what was there.
    pub fn take(&mut self) -> Value {
        core::mem::take(self)
    }

    /// Look up a direct child: an object key, or an array index.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Object(obj) => obj.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Look up a direct child mutably.
    pub fn child_mut(&mut self, segment: &str) -> Option<&mut Value> {
        match self {
            Value::Object(obj) => obj.get_mut(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(move |i| items.get_mut(i)),
            _ => None,
        }
    }

    /// Write `value` at `segments` below this value, turning anything in the
    /// way into objects. Existing array elements are addressed by index.
    pub(crate) fn set_in<S: AsRef<str>>(&mut self, segments: &[S], value: Value) {
        let Some((head, rest)) = segments.split_first() else {
            *self = value;
            return;
        };
        let head = head.as_ref();

        if let Value::Array(items) = self {
            if let Some(slot) = head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                slot.set_in(rest, value);
                return;
            }
        }

        match self {
            Value::Object(obj) => obj.set_path(segments, value),
            other => {
                let mut obj = Object::new();
                obj.set_path(segments, value);
                *other = Value::Object(obj);
            }
        }
    }
}

impl fmt::Display for Value {
    /// Scalars render as their text, containers as a short summary.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Value::Enum(e) => write!(f, "{}::{}", e.enum_name, e.case),
            Value::Array(items) => write!(f, "[{} items]", items.len()),
            Value::Object(obj) => write!(f, "{{{} entries}}", obj.len()),
            Value::File(file) => write!(f, "file {}", file.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::Date(value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<FileHandle> for Value {
    fn from(value: FileHandle) -> Self {
        Value::File(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}
