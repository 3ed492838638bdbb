//! Resolved class schemas.

use std::any::Any;
use std::fmt;

use facet::Shape;
use inlet_path::{Origin, SourcePath};
use inlet_value::Value;

use crate::{Accessor, Arg, Arguments, ConstructError, ConstructErrorKind, Mappable, Rule, Type};

/// A constructed, type-erased instance of a declared class.
pub type Instance = Box<dyn Any + Send>;

/// What a property is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Passed positionally to the constructor.
    Constructor,
    /// Assigned by name after construction.
    Field,
    /// Class-level constraint: validated, never assigned.
    ValidationOnly,
}

/// Default of a property.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    /// No default: the property is required.
    #[default]
    Missing,
    /// Used when the value is absent.
    Value(Value),
    /// The Rust type's own default is used when the value is absent.
    FromType,
}

impl DefaultValue {
    /// Whether there is no default.
    pub fn is_missing(&self) -> bool {
        matches!(self, DefaultValue::Missing)
    }

    /// The default value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            DefaultValue::Value(value) => Some(value),
            DefaultValue::Missing | DefaultValue::FromType => None,
        }
    }
}

/// One resolved constructor parameter, field or class-level constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Member name, used to pass or assign the value.
    pub name: String,
    /// Lookup key below the owning path, normalized for headers.
    pub key: String,
    /// Declared type.
    pub ty: Type,
    /// What the property is used for.
    pub role: Role,
    /// Default when absent.
    pub default: DefaultValue,
    /// Declared origin, or the one inherited from the owner.
    pub origin: Origin,
    /// Fully qualified location of the value.
    pub source_path: SourcePath,
    /// Computes the value instead of looking it up.
    pub accessor: Option<Accessor>,
    /// Declared rules beyond the ones implied by the type.
    pub extra_rules: Vec<Rule>,
}

impl Property {
    /// Whether the value must be present.
    pub fn is_required(&self) -> bool {
        self.default.is_missing()
    }
}

/// Type-erased construction hooks of a [`Mappable`] class.
#[derive(Clone, Copy)]
pub struct ClassVTable {
    /// Build an instance from positional constructor arguments.
    pub construct: fn(&mut Arguments) -> Result<Instance, ConstructError>,
    /// Assign one field by name.
    pub assign: fn(&mut Instance, &str, Arg) -> Result<(), ConstructError>,
}

impl ClassVTable {
    /// The hooks of `T`.
    pub fn of<T: Mappable>() -> Self {
        Self {
            construct: |args| T::construct(args).map(|value| Box::new(value) as Instance),
            assign: |instance, field, value| match (**instance).downcast_mut::<T>() {
                Some(target) => target.assign(field, value),
                None => Err(ConstructError::new(ConstructErrorKind::NotAnInstance {
                    expected: T::CLASS.to_string(),
                })),
            },
        }
    }
}

impl fmt::Debug for ClassVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassVTable").finish_non_exhaustive()
    }
}

/// How instances of a class are built.
#[derive(Debug, Clone, Copy)]
pub enum ClassBuilder {
    /// Through the hooks of a [`Mappable`] class.
    Hooks(ClassVTable),
    /// Field by field, through the class's facet shape.
    Shape(&'static Shape),
}

/// The resolved shape of a class: constructor properties, then fields, then
/// class-level constraints.
///
/// Schemas are immutable once resolved and hold no request data, so they are
/// shared behind an `Arc` across mapping operations.
#[derive(Debug, Clone)]
pub struct ClassSchema {
    class: String,
    properties: Vec<Property>,
    builder: ClassBuilder,
}

impl ClassSchema {
    pub(crate) fn new(class: String, properties: Vec<Property>, builder: ClassBuilder) -> Self {
        Self {
            class,
            properties,
            builder,
        }
    }

    /// Class identifier.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// All properties, in order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// The property called `name`.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Constructor parameters, in declaration order.
    pub fn constructor_properties(&self) -> impl Iterator<Item = &Property> {
        self.with_role(Role::Constructor)
    }

    /// Assignable fields, in declaration order.
    pub fn field_properties(&self) -> impl Iterator<Item = &Property> {
        self.with_role(Role::Field)
    }

    /// Class-level constraints.
    pub fn validation_only_properties(&self) -> impl Iterator<Item = &Property> {
        self.with_role(Role::ValidationOnly)
    }

    fn with_role(&self, role: Role) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(move |p| p.role == role)
    }

    /// How instances are built.
    pub fn builder(&self) -> ClassBuilder {
        self.builder
    }
}

impl PartialEq for ClassSchema {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.properties == other.properties
    }
}
