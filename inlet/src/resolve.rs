//! Schema resolution: from declaration tables to [`ClassSchema`]s.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use inlet_path::{Origin, PathError, SourcePath};
use tracing::{debug, trace};

use crate::{
    ClassDecl, ClassSchema, DefaultValue, MemberDecl, Metadata, Property, Registry, Role, Type,
    normalize_header_name,
};

/// Nesting depth beyond which resolution gives up.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A static declaration bug, found before any request data is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The class is not registered.
    UnknownClass {
        /// Requested class.
        class: String,
    },
    /// A member's type name is neither built in nor registered.
    UnknownType {
        /// The offending type name.
        type_name: String,
        /// Owning class.
        class: String,
        /// Member name.
        property: String,
    },
    /// An `array` member without an element type.
    MissingElementType {
        /// Owning class.
        class: String,
        /// Member name.
        property: String,
    },
    /// An element type on a member that is not an array.
    UnexpectedElementType {
        /// Owning class.
        class: String,
        /// Member name.
        property: String,
    },
    /// A class contains itself.
    Cycle {
        /// Classes on the resolution stack, ending with the repeated one.
        chain: Vec<String>,
    },
    /// Nesting is deeper than the configured maximum.
    DepthExceeded {
        /// Class that would have been resolved next.
        class: String,
        /// The maximum.
        max_depth: usize,
    },
    /// A class-level constraint that does not say where its value lives.
    ConstraintWithoutKey {
        /// Owning class.
        class: String,
    },
    /// Two members share a name.
    DuplicateProperty {
        /// Owning class.
        class: String,
        /// The shared name.
        property: String,
    },
    /// Two properties read the same source path as different types.
    AmbiguousSource {
        /// Owning class.
        class: String,
        /// The shared path.
        path: String,
    },
    /// Attributes of one member contradict each other.
    ConflictingMetadata {
        /// Owning class.
        class: String,
        /// Member name, or the constraint key.
        property: String,
        /// What contradicts what.
        detail: String,
    },
    /// A key that does not form a valid path segment.
    InvalidKey {
        /// Owning class.
        class: String,
        /// Member name.
        property: String,
        /// Underlying path error.
        source: PathError,
    },
    /// A reflected type that cannot be mapped as written.
    InvalidShape {
        /// The type's identifier.
        type_name: String,
        /// What is wrong with it.
        detail: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownClass { class } => write!(f, "class `{class}` is not registered"),
            SchemaError::UnknownType {
                type_name,
                class,
                property,
            } => write!(f, "unknown type `{type_name}` for {class}.{property}"),
            SchemaError::MissingElementType { class, property } => {
                write!(f, "array {class}.{property} does not declare its element type")
            }
            SchemaError::UnexpectedElementType { class, property } => {
                write!(f, "{class}.{property} declares an element type but is not an array")
            }
            SchemaError::Cycle { chain } => {
                write!(f, "class cycle: {}", chain.join(" -> "))
            }
            SchemaError::DepthExceeded { class, max_depth } => {
                write!(f, "nesting deeper than {max_depth} levels at `{class}`")
            }
            SchemaError::ConstraintWithoutKey { class } => {
                write!(f, "class-level constraint on `{class}` has no key")
            }
            SchemaError::DuplicateProperty { class, property } => {
                write!(f, "{class}.{property} is declared more than once")
            }
            SchemaError::AmbiguousSource { class, path } => {
                write!(f, "`{path}` is read with different types in `{class}`")
            }
            SchemaError::ConflictingMetadata {
                class,
                property,
                detail,
            } => write!(f, "{class}.{property}: {detail}"),
            SchemaError::InvalidKey {
                class,
                property,
                source,
            } => write!(f, "invalid key for {class}.{property}: {source}"),
            SchemaError::InvalidShape { type_name, detail } => {
                write!(f, "`{type_name}` cannot be mapped: {detail}")
            }
        }
    }
}

impl core::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            SchemaError::InvalidKey { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Resolves class identifiers against a [`Registry`].
///
/// ```
/// use inlet::{Arguments, ClassDecl, ConstructError, Mappable, Registry, Resolver, Type};
///
/// struct Page {
///     number: i64,
/// }
///
/// impl Mappable for Page {
///     const CLASS: &'static str = "Page";
///
///     fn declare(decl: &mut ClassDecl) {
///         decl.param("number", "int");
///     }
///
///     fn construct(args: &mut Arguments) -> Result<Self, ConstructError> {
///         Ok(Self { number: args.next_value()? })
///     }
/// }
///
/// let registry = Registry::new().with_class::<Page>();
/// let schema = Resolver::new(&registry).resolve("Page").unwrap();
/// let number = schema.property("number").unwrap();
/// assert_eq!(number.ty, Type::Integer);
/// assert_eq!(number.source_path.to_string(), "input.number");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r Registry,
    max_depth: usize,
}

impl<'r> Resolver<'r> {
    /// A resolver with the default maximum depth.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply classes may nest.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve a top-level class.
    pub fn resolve(&self, class: &str) -> Result<ClassSchema, SchemaError> {
        let mut stack = Vec::new();
        self.resolve_class(class, None, &mut stack)
    }

    fn resolve_class(
        &self,
        class: &str,
        parent: Option<&SourcePath>,
        stack: &mut Vec<String>,
    ) -> Result<ClassSchema, SchemaError> {
        if stack.iter().any(|c| c == class) {
            let mut chain = stack.clone();
            chain.push(class.to_string());
            return Err(SchemaError::Cycle { chain });
        }
        if stack.len() >= self.max_depth {
            return Err(SchemaError::DepthExceeded {
                class: class.to_string(),
                max_depth: self.max_depth,
            });
        }
        let entry = self
            .registry
            .class(class)
            .ok_or_else(|| SchemaError::UnknownClass {
                class: class.to_string(),
            })?;

        let decl = entry.declaration(class)?;

        stack.push(class.to_string());
        let properties = self.resolve_properties(&decl, parent, stack);
        stack.pop();
        let properties = properties?;

        check_unique(class, &properties)?;
        debug!(
            class,
            parent = parent.map(tracing::field::display),
            properties = properties.len(),
            "resolved class schema"
        );
        Ok(ClassSchema::new(class.to_string(), properties, entry.builder()))
    }

    fn resolve_properties(
        &self,
        decl: &ClassDecl,
        parent: Option<&SourcePath>,
        stack: &mut Vec<String>,
    ) -> Result<Vec<Property>, SchemaError> {
        let mut properties =
            Vec::with_capacity(decl.params.len() + decl.fields.len() + decl.constraints.len());

        for (members, role) in [(&decl.params, Role::Constructor), (&decl.fields, Role::Field)] {
            for member in members {
                properties.push(self.resolve_member(&decl.class, member, role, parent, stack)?);
            }
        }
        for meta in &decl.constraints {
            properties.push(self.resolve_constraint(&decl.class, meta, parent, stack)?);
        }
        Ok(properties)
    }

    fn resolve_member(
        &self,
        class: &str,
        member: &MemberDecl,
        role: Role,
        parent: Option<&SourcePath>,
        stack: &mut Vec<String>,
    ) -> Result<Property, SchemaError> {
        let meta = &member.meta;
        check_conflicts(class, &member.name, meta)?;

        let key = meta.key().unwrap_or(member.name.as_str());
        let (origin, key, source_path) = locate(class, &member.name, meta, key, parent)?;
        let ty = self.resolve_type(
            class,
            &member.name,
            member.type_name.as_deref(),
            member.element.as_deref(),
            &source_path,
            stack,
        )?;

        trace!(%source_path, %ty, ?role, "resolved property");
        Ok(Property {
            name: member.name.clone(),
            key,
            ty,
            role,
            default: member.default.clone(),
            origin,
            source_path,
            accessor: meta.accessor(),
            extra_rules: meta.rules().to_vec(),
        })
    }

    fn resolve_constraint(
        &self,
        class: &str,
        meta: &Metadata,
        parent: Option<&SourcePath>,
        stack: &mut Vec<String>,
    ) -> Result<Property, SchemaError> {
        let Some(key) = meta.key() else {
            return Err(SchemaError::ConstraintWithoutKey {
                class: class.to_string(),
            });
        };
        check_conflicts(class, key, meta)?;

        let (origin, key, source_path) = locate(class, key, meta, key, parent)?;
        let ty = match meta.value_type() {
            Some(type_name) => {
                self.resolve_type(class, &key, Some(type_name), None, &source_path, stack)?
            }
            None => Type::Mixed,
        };

        trace!(%source_path, %ty, "resolved class-level constraint");
        Ok(Property {
            name: key.clone(),
            key,
            ty,
            role: Role::ValidationOnly,
            default: DefaultValue::Missing,
            origin,
            source_path,
            accessor: meta.accessor(),
            extra_rules: meta.rules().to_vec(),
        })
    }

    fn resolve_type(
        &self,
        class: &str,
        property: &str,
        type_name: Option<&str>,
        element: Option<&str>,
        path: &SourcePath,
        stack: &mut Vec<String>,
    ) -> Result<Type, SchemaError> {
        let Some(type_name) = type_name else {
            return Ok(Type::Mixed);
        };

        if type_name == "array" {
            let Some(element) = element else {
                return Err(SchemaError::MissingElementType {
                    class: class.to_string(),
                    property: property.to_string(),
                });
            };
            let element = self.resolve_type(
                class,
                property,
                Some(element),
                None,
                &path.wildcard(),
                stack,
            )?;
            return Ok(Type::Array(Box::new(element)));
        }

        if element.is_some() {
            return Err(SchemaError::UnexpectedElementType {
                class: class.to_string(),
                property: property.to_string(),
            });
        }

        // `T[]` is shorthand for an array of `T`
        if let Some(inner) = type_name.strip_suffix("[]") {
            return self.resolve_type(class, property, Some("array"), Some(inner), path, stack);
        }

        let ty = match type_name {
            "string" => Type::String,
            "int" | "integer" => Type::Integer,
            "float" => Type::Float,
            "bool" | "boolean" => Type::Boolean,
            "date" | "datetime" => Type::Date,
            "mixed" | "file" => Type::Mixed,
            other => {
                if let Some(def) = self.registry.enum_def(other) {
                    Type::Enum(def.clone())
                } else if self.registry.contains_class(other) {
                    Type::Class(Arc::new(self.resolve_class(other, Some(path), stack)?))
                } else if let Some(rejection) = self.registry.rejection(other) {
                    return Err(rejection.clone());
                } else {
                    return Err(SchemaError::UnknownType {
                        type_name: other.to_string(),
                        class: class.to_string(),
                        property: property.to_string(),
                    });
                }
            }
        };
        Ok(ty)
    }
}

/// Origin, normalized key and full path of a member or constraint.
fn locate(
    class: &str,
    property: &str,
    meta: &Metadata,
    key: &str,
    parent: Option<&SourcePath>,
) -> Result<(Origin, String, SourcePath), SchemaError> {
    let origin = meta
        .source()
        .or_else(|| parent.and_then(SourcePath::origin))
        .unwrap_or(Origin::Input);
    let key = match origin {
        Origin::Header => normalize_header_name(key),
        _ => key.to_string(),
    };
    let base = parent.cloned().unwrap_or_else(|| SourcePath::root(origin));
    // a dotted key reaches into nested data
    let source_path = key
        .split('.')
        .try_fold(base, |path, segment| path.child(segment))
        .map_err(|source| SchemaError::InvalidKey {
            class: class.to_string(),
            property: property.to_string(),
            source,
        })?;
    Ok((origin, key, source_path))
}

fn check_conflicts(class: &str, property: &str, meta: &Metadata) -> Result<(), SchemaError> {
    match meta.conflicts().first() {
        Some(detail) => Err(SchemaError::ConflictingMetadata {
            class: class.to_string(),
            property: property.to_string(),
            detail: detail.clone(),
        }),
        None => Ok(()),
    }
}

fn check_unique(class: &str, properties: &[Property]) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    let mut paths: HashMap<&SourcePath, &Type> = HashMap::new();

    for property in properties {
        if property.role != Role::ValidationOnly
            && !names.insert(property.name.as_str())
        {
            return Err(SchemaError::DuplicateProperty {
                class: class.to_string(),
                property: property.name.clone(),
            });
        }
        // constraints are checked on their own copy under `__request`
        if property.role == Role::ValidationOnly {
            continue;
        }
        if let Some(previous) = paths.insert(&property.source_path, &property.ty) {
            if *previous != property.ty {
                return Err(SchemaError::AmbiguousSource {
                    class: class.to_string(),
                    path: property.source_path.to_string(),
                });
            }
        }
    }
    Ok(())
}
