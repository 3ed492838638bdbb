//! Declaration tables: what a class says about itself.
//!
//! The resolver works on a [`ClassDecl`] holding constructor parameters,
//! fields and class-level constraints, each carrying [`Attribute`]s.
//! Types deriving `Facet` get theirs read off their shape (see
//! [`declaration_of`](crate::declaration_of)); [`Mappable`](crate::Mappable)
//! types fill one by hand. Attributes write into a [`Metadata`] record;
//! contradicting writes are remembered and reported by the resolver.

use std::fmt;

use inlet_path::Origin;
use inlet_value::Value;

use crate::{DefaultValue, RequestData, Rule};

/// Where an attribute is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A constructor parameter or a field.
    Member,
    /// The class as a whole.
    Class,
}

/// Something that can be attached to a member or a class to declare its
/// source, key, accessor or extra rules.
pub trait Attribute {
    /// Record this attribute's declarations into `meta`.
    fn apply(&self, target: Target, meta: &mut Metadata);
}

/// A named function computing a value from the request object.
#[derive(Clone, Copy)]
pub struct Accessor {
    name: &'static str,
    get: fn(&dyn RequestData) -> Value,
}

impl Accessor {
    /// `request.is_ajax()`.
    pub const IS_AJAX: Accessor = Accessor::new("is_ajax", |request| request.is_ajax().into());

    /// `request.method()`.
    pub const METHOD: Accessor = Accessor::new("method", |request| request.method().into());

    /// An accessor with a name used for diagnostics and equality.
    pub const fn new(name: &'static str, get: fn(&dyn RequestData) -> Value) -> Self {
        Self { name, get }
    }

    /// Name of the accessor.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Compute the value.
    pub fn get(&self, request: &dyn RequestData) -> Value {
        (self.get)(request)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Accessor").field(&self.name).finish()
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Declared metadata of one member or one class-level constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    source: Option<Origin>,
    key: Option<String>,
    accessor: Option<Accessor>,
    rules: Vec<Rule>,
    value_type: Option<String>,
    conflicts: Vec<String>,
}

impl Metadata {
    /// Declare the origin.
    pub fn set_source(&mut self, origin: Origin) {
        if let Some(previous) = self.source.replace(origin) {
            if previous != origin {
                self.conflicts
                    .push(format!("source declared as both `{previous}` and `{origin}`"));
            }
        }
    }

    /// Declare the lookup key.
    pub fn set_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        if let Some(previous) = &self.key {
            if *previous != key {
                self.conflicts
                    .push(format!("key declared as both `{previous}` and `{key}`"));
            }
        }
        self.key = Some(key);
    }

    /// Declare the accessor.
    pub fn set_accessor(&mut self, accessor: Accessor) {
        if let Some(previous) = self.accessor.replace(accessor) {
            if previous != accessor {
                self.conflicts.push(format!(
                    "accessor declared as both `{}` and `{}`",
                    previous.name(),
                    accessor.name()
                ));
            }
        }
    }

    /// Declare the value type of a class-level constraint.
    pub fn set_value_type(&mut self, type_name: impl Into<String>) {
        self.value_type = Some(type_name.into());
    }

    /// Append an extra rule.
    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Declared origin.
    pub fn source(&self) -> Option<Origin> {
        self.source
    }

    /// Declared key.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Declared accessor.
    pub fn accessor(&self) -> Option<Accessor> {
        self.accessor
    }

    /// Declared extra rules, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Declared value type, only meaningful on class-level constraints.
    pub fn value_type(&self) -> Option<&str> {
        self.value_type.as_deref()
    }

    /// Contradicting declarations, in the order they were made.
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }
}

/// A constructor parameter or a field.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDecl {
    pub(crate) name: String,
    pub(crate) type_name: Option<String>,
    pub(crate) element: Option<String>,
    pub(crate) default: DefaultValue,
    pub(crate) meta: Metadata,
}

impl MemberDecl {
    fn new(name: &str, type_name: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.map(str::to_string),
            element: None,
            default: DefaultValue::Missing,
            meta: Metadata::default(),
        }
    }

    /// Attach an attribute.
    pub fn attr(&mut self, attr: impl Attribute) -> &mut Self {
        attr.apply(Target::Member, &mut self.meta);
        self
    }

    /// Declare the element type of an `array` member.
    pub fn element(&mut self, type_name: &str) -> &mut Self {
        self.element = Some(type_name.to_string());
        self
    }

    /// Declare a default value, making the member optional.
    pub fn default_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = DefaultValue::Value(value.into());
        self
    }

    /// Let the Rust type supply the default, making the member optional.
    pub(crate) fn default_from_type(&mut self) -> &mut Self {
        self.default = DefaultValue::FromType;
        self
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared metadata.
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }
}

/// Everything a class declares about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub(crate) class: String,
    pub(crate) params: Vec<MemberDecl>,
    pub(crate) fields: Vec<MemberDecl>,
    pub(crate) constraints: Vec<Metadata>,
}

impl ClassDecl {
    /// An empty declaration for `class`.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            params: Vec::new(),
            fields: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Declare the next constructor parameter.
    pub fn param(&mut self, name: &str, type_name: &str) -> &mut MemberDecl {
        push_member(&mut self.params, MemberDecl::new(name, Some(type_name)))
    }

    /// Declare the next constructor parameter without a type.
    pub fn untyped_param(&mut self, name: &str) -> &mut MemberDecl {
        push_member(&mut self.params, MemberDecl::new(name, None))
    }

    /// Declare the next assignable field.
    pub fn field(&mut self, name: &str, type_name: &str) -> &mut MemberDecl {
        push_member(&mut self.fields, MemberDecl::new(name, Some(type_name)))
    }

    /// Declare the next assignable field without a type.
    pub fn untyped_field(&mut self, name: &str) -> &mut MemberDecl {
        push_member(&mut self.fields, MemberDecl::new(name, None))
    }

    /// Declare a class-level constraint.
    pub fn constraint(&mut self, attr: impl Attribute) -> &mut Self {
        let mut meta = Metadata::default();
        attr.apply(Target::Class, &mut meta);
        self.constraints.push(meta);
        self
    }

    /// Class identifier.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Declared constructor parameters.
    pub fn params(&self) -> &[MemberDecl] {
        &self.params
    }

    /// Declared fields.
    pub fn fields(&self) -> &[MemberDecl] {
        &self.fields
    }
}

fn push_member(members: &mut Vec<MemberDecl>, member: MemberDecl) -> &mut MemberDecl {
    let index = members.len();
    members.push(member);
    &mut members[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contradicting_writes_are_remembered() {
        let mut meta = Metadata::default();
        meta.set_source(Origin::Query);
        meta.set_source(Origin::Query);
        assert!(meta.conflicts().is_empty());

        meta.set_key("a");
        meta.set_key("b");
        assert_eq!(meta.key(), Some("b"));
        assert_eq!(meta.conflicts(), ["key declared as both `a` and `b`"]);
    }

    #[test]
    fn members_keep_declaration_order() {
        let mut decl = ClassDecl::new("Thing");
        decl.param("b", "string");
        decl.param("a", "int").default_value(3i64);
        decl.untyped_field("z");

        let names: Vec<_> = decl.params().iter().map(MemberDecl::name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(decl.params()[1].default.value(), Some(&Value::Integer(3)));
        assert_eq!(decl.fields()[0].type_name, None);
    }
}
