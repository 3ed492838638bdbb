//! The classes and enums a mapper knows by name.
//!
//! Types deriving `Facet` are registered with [`Registry::with_type`], which
//! also registers every struct and enum they refer to. Hand-declared
//! [`Mappable`] classes and [`MappableEnum`]s are registered one by one.
//! Every change gives the registry a new [`RegistryId`], which is what
//! schema caches key on alongside the class name.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use facet::{Facet, Shape, Type as ShapeType, UserType};

use crate::{
    ClassBuilder, ClassDecl, ClassVTable, EnumDef, Mappable, MappableEnum, SchemaError,
    declaration_of, enum_def_of, nested_user_shape,
};

/// Identity of one state of a [`Registry`].
///
/// Clones share the id of the registry they were cloned from until either is
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy)]
pub(crate) enum ClassEntry {
    Declared {
        declare: fn(&mut ClassDecl),
        vtable: ClassVTable,
    },
    Reflected(&'static Shape),
}

impl ClassEntry {
    pub(crate) fn declaration(&self, class: &str) -> Result<ClassDecl, SchemaError> {
        match self {
            ClassEntry::Declared { declare, .. } => {
                let mut decl = ClassDecl::new(class);
                declare(&mut decl);
                Ok(decl)
            }
            ClassEntry::Reflected(shape) => declaration_of(*shape),
        }
    }

    pub(crate) fn builder(&self) -> ClassBuilder {
        match self {
            ClassEntry::Declared { vtable, .. } => ClassBuilder::Hooks(*vtable),
            ClassEntry::Reflected(shape) => ClassBuilder::Shape(*shape),
        }
    }
}

/// The classes and enums that declarations may refer to by name.
#[derive(Clone)]
pub struct Registry {
    id: RegistryId,
    classes: HashMap<String, ClassEntry>,
    enums: HashMap<String, EnumDef>,
    rejected: HashMap<String, SchemaError>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            id: RegistryId::next(),
            classes: HashMap::new(),
            enums: HashMap::new(),
            rejected: HashMap::new(),
        }
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the current contents.
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Register `T` and every struct and enum it refers to.
    pub fn with_type<T: Facet<'static>>(mut self) -> Self {
        self.register_type::<T>();
        self
    }

    /// Register `T` and every struct and enum it refers to.
    pub fn register_type<T: Facet<'static>>(&mut self) -> &mut Self {
        self.register_shape(T::SHAPE)
    }

    /// Register a struct or enum shape under its type identifier, then the
    /// shapes its fields refer to. Shapes already registered are skipped.
    ///
    /// An enum that cannot be mapped is remembered, and resolving a class
    /// that uses it reports why.
    pub fn register_shape(&mut self, shape: &'static Shape) -> &mut Self {
        let name = shape.type_identifier;
        if self.contains_class(name) || self.enums.contains_key(name) {
            return self;
        }
        self.id = RegistryId::next();

        match &shape.ty {
            ShapeType::User(UserType::Struct(struct_type)) => {
                self.classes
                    .insert(name.to_string(), ClassEntry::Reflected(shape));
                for field in struct_type.fields {
                    if let Some(nested) = nested_user_shape(field.shape()) {
                        self.register_shape(nested);
                    }
                }
            }
            ShapeType::User(UserType::Enum(_)) => match enum_def_of(shape) {
                Ok(def) => {
                    self.rejected.remove(name);
                    self.enums.insert(def.name.clone(), def);
                }
                Err(err) => {
                    self.rejected.insert(name.to_string(), err);
                }
            },
            _ => {}
        }
        self
    }

    /// Register `T` under [`Mappable::CLASS`].
    pub fn with_class<T: Mappable>(mut self) -> Self {
        self.register_class::<T>();
        self
    }

    /// Register `T` under [`Mappable::CLASS`].
    pub fn register_class<T: Mappable>(&mut self) -> &mut Self {
        self.id = RegistryId::next();
        self.classes.insert(
            T::CLASS.to_string(),
            ClassEntry::Declared {
                declare: T::declare,
                vtable: ClassVTable::of::<T>(),
            },
        );
        self
    }

    /// Register `E` under [`MappableEnum::ENUM`].
    pub fn with_enum<E: MappableEnum>(mut self) -> Self {
        self.register_enum::<E>();
        self
    }

    /// Register `E` under [`MappableEnum::ENUM`].
    pub fn register_enum<E: MappableEnum>(&mut self) -> &mut Self {
        self.register_enum_def(E::definition())
    }

    /// Register an enum known only by its definition. Values of it can be
    /// cast and validated, and extracted as [`Value`](crate::Value)s.
    pub fn register_enum_def(&mut self, def: EnumDef) -> &mut Self {
        self.id = RegistryId::next();
        self.rejected.remove(&def.name);
        self.enums.insert(def.name.clone(), def);
        self
    }

    /// The enum registered as `name`.
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    /// Whether a class is registered as `name`.
    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// The declaration table of the class registered as `name`.
    pub fn declaration(&self, name: &str) -> Option<Result<ClassDecl, SchemaError>> {
        let entry = self.classes.get(name)?;
        Some(entry.declaration(name))
    }

    pub(crate) fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    /// Why the type registered as `name` cannot be mapped, if it cannot.
    pub(crate) fn rejection(&self, name: &str) -> Option<&SchemaError> {
        self.rejected.get(name)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<_> = self.classes.keys().collect();
        classes.sort();
        let mut enums: Vec<_> = self.enums.keys().collect();
        enums.sort();
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("classes", &classes)
            .field("enums", &enums)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use facet::Facet;

    use super::*;

    #[derive(Facet)]
    #[allow(dead_code)]
    struct Outer {
        inner: Option<Inner>,
        many: Vec<Inner>,
        mood: Mood,
    }

    #[derive(Facet)]
    #[allow(dead_code)]
    struct Inner {
        value: i64,
    }

    #[derive(Facet)]
    #[repr(u8)]
    #[allow(dead_code)]
    enum Mood {
        Calm,
        Grumpy,
    }

    #[derive(Facet)]
    #[repr(u8)]
    #[allow(dead_code)]
    enum Shaped {
        Circle { radius: f64 },
    }

    #[derive(Facet)]
    #[allow(dead_code)]
    struct Drawing {
        shape: Shaped,
    }

    #[test]
    fn registering_a_type_registers_what_it_refers_to() {
        let registry = Registry::new().with_type::<Outer>();
        assert!(registry.contains_class("Outer"));
        assert!(registry.contains_class("Inner"));
        assert_eq!(
            registry.enum_def("Mood"),
            Some(&EnumDef::unit("Mood", ["Calm", "Grumpy"]))
        );
    }

    #[test]
    fn enums_with_data_are_remembered_as_rejected() {
        let registry = Registry::new().with_type::<Drawing>();
        assert!(registry.enum_def("Shaped").is_none());
        insta::assert_snapshot!(
            registry.rejection("Shaped").unwrap(),
            @"`Shaped` cannot be mapped: variant `Circle` carries data"
        );
    }

    #[test]
    fn changes_produce_a_new_id() {
        let registry = Registry::new();
        let copy = registry.clone();
        assert_eq!(registry.id(), copy.id());

        let grown = copy.with_type::<Inner>();
        assert_ne!(registry.id(), grown.id());
        assert_ne!(Registry::new().id(), Registry::new().id());
    }
}
