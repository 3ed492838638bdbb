//! Built-in attributes.

use inlet_path::Origin;
use inlet_value::Value;

use crate::{Accessor, Attribute, Metadata, RequestData, Rule, Target, normalize_header_name};

/// Read the member from a specific request bucket instead of `input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source(Origin);

impl Source {
    /// Read from the given origin.
    pub const fn new(origin: Origin) -> Self {
        Self(origin)
    }

    /// Query string and body merged.
    pub const fn input() -> Self {
        Self(Origin::Input)
    }

    /// Query string only.
    pub const fn query() -> Self {
        Self(Origin::Query)
    }

    /// Request body only.
    pub const fn body() -> Self {
        Self(Origin::Body)
    }

    /// Request headers. The key is normalized like a header name.
    pub const fn header() -> Self {
        Self(Origin::Header)
    }

    /// Uploaded files.
    pub const fn file() -> Self {
        Self(Origin::File)
    }
}

impl Attribute for Source {
    fn apply(&self, _target: Target, meta: &mut Metadata) {
        meta.set_source(self.0);
    }
}

/// Look the member up under a different key than its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(String);

impl Key {
    /// Use `key` as the lookup key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl Attribute for Key {
    fn apply(&self, _target: Target, meta: &mut Metadata) {
        meta.set_key(self.0.clone());
    }
}

/// Read the member from a request header.
///
/// ```
/// use inlet::{Attribute, Header, Metadata, Origin, Target};
///
/// let mut meta = Metadata::default();
/// Header::new("X-Flag").apply(Target::Member, &mut meta);
/// assert_eq!(meta.source(), Some(Origin::Header));
/// assert_eq!(meta.key(), Some("x_flag"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
}

impl Header {
    /// The header called `name`, in any spelling.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Attribute for Header {
    fn apply(&self, _target: Target, meta: &mut Metadata) {
        meta.set_source(Origin::Header);
        meta.set_key(normalize_header_name(&self.name));
        meta.set_value_type("string");
    }
}

/// The `Content-Type` header, optionally restricted to a set of media types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentType {
    must_be: Vec<String>,
}

impl ContentType {
    /// `application/json`
    pub const APPLICATION_JSON: &'static str = "application/json";

    /// Any content type.
    pub fn any() -> Self {
        Self::default()
    }

    /// One of the listed content types.
    pub fn must_be<I, S>(media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            must_be: media_types.into_iter().map(Into::into).collect(),
        }
    }
}

impl Attribute for ContentType {
    fn apply(&self, target: Target, meta: &mut Metadata) {
        Header::new("Content-Type").apply(target, meta);
        if !self.must_be.is_empty() {
            meta.push_rule(Rule::In(self.must_be.clone()));
        }
    }
}

/// Whether the request was made with `X-Requested-With: XMLHttpRequest`.
///
/// On a class without `must_be`, the request is required to be an AJAX call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ajax {
    must_be: Option<bool>,
}

impl Ajax {
    /// The flag, unconstrained.
    pub const fn new() -> Self {
        Self { must_be: None }
    }

    /// The flag, which must equal `expected`.
    pub const fn must_be(expected: bool) -> Self {
        Self {
            must_be: Some(expected),
        }
    }
}

impl Attribute for Ajax {
    fn apply(&self, target: Target, meta: &mut Metadata) {
        meta.set_source(Origin::Request);
        meta.set_key("ajax");
        meta.set_accessor(Accessor::IS_AJAX);
        meta.set_value_type("bool");

        match (self.must_be, target) {
            (Some(true), _) | (None, Target::Class) => meta.push_rule(Rule::Accepted),
            (Some(false), _) => meta.push_rule(Rule::Declined),
            (None, Target::Member) => {}
        }
    }
}

/// The request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Method;

impl Attribute for Method {
    fn apply(&self, _target: Target, meta: &mut Metadata) {
        meta.set_source(Origin::Request);
        meta.set_key("method");
        meta.set_accessor(Accessor::METHOD);
        meta.set_value_type("string");
    }
}

/// A value computed from the request object by a custom function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Computed {
    key: &'static str,
    value_type: &'static str,
    accessor: Accessor,
}

impl Computed {
    /// Compute the value stored under `request.<key>` with `get`.
    /// `value_type` only matters when used as a class-level constraint.
    pub const fn new(
        key: &'static str,
        value_type: &'static str,
        get: fn(&dyn RequestData) -> Value,
    ) -> Self {
        Self {
            key,
            value_type,
            accessor: Accessor::new(key, get),
        }
    }
}

impl Attribute for Computed {
    fn apply(&self, _target: Target, meta: &mut Metadata) {
        meta.set_source(Origin::Request);
        meta.set_key(self.key);
        meta.set_accessor(self.accessor);
        meta.set_value_type(self.value_type);
    }
}

impl<A: Attribute, B: Attribute> Attribute for (A, B) {
    fn apply(&self, target: Target, meta: &mut Metadata) {
        self.0.apply(target, meta);
        self.1.apply(target, meta);
    }
}

impl<A: Attribute, B: Attribute, C: Attribute> Attribute for (A, B, C) {
    fn apply(&self, target: Target, meta: &mut Metadata) {
        self.0.apply(target, meta);
        self.1.apply(target, meta);
        self.2.apply(target, meta);
    }
}
