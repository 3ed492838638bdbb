//! Building instances from a cast data tree.
//!
//! Classes declared through [`Mappable`] are built by their hooks: positional
//! construction, then field assignment. Types deriving `Facet` are built
//! field by field through a [`Partial`], reading each field at its property's
//! source path.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};
use facet::{Def, Facet, ScalarType, Type as ShapeType, UserType};
use facet_reflect::{Partial, ReflectError};
use inlet_path::SourcePath;
use inlet_value::{FileHandle, Object, Value};
use tracing::trace;

use crate::{
    Arg, Arguments, ClassBuilder, ClassSchema, ConstructError, ConstructErrorKind, DefaultValue,
    Instance, Mappable, Property, Role, Type,
};

/// Build a `T` from `data`, which must have been flattened with `schema`.
pub fn reconstruct<T: Mappable>(schema: &ClassSchema, data: &Object) -> Result<T, ConstructError> {
    if schema.class() != T::CLASS {
        return Err(not_an_instance(T::CLASS).in_class(schema.class()));
    }
    let instance = reconstruct_instance(schema, data)?;
    instance
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| not_an_instance(T::CLASS))
}

/// Build a type-erased instance of the class `schema` describes.
///
/// Constructor properties are passed positionally, then fields are assigned
/// by name. Class-level constraints are skipped.
pub fn reconstruct_instance(schema: &ClassSchema, data: &Object) -> Result<Instance, ConstructError> {
    let class = schema.class();
    let ClassBuilder::Hooks(vtable) = schema.builder() else {
        return Err(ConstructError::new(ConstructErrorKind::Unbuildable {
            class: class.to_string(),
        }));
    };

    let mut args = Arguments::new();
    for property in schema.constructor_properties() {
        args.push(property.name.as_str(), resolve_arg(schema, property, data)?);
    }
    let mut instance = (vtable.construct)(&mut args).map_err(|e| e.in_class(class))?;

    for property in schema.field_properties() {
        let value = resolve_arg(schema, property, data)?;
        (vtable.assign)(&mut instance, &property.name, value)
            .map_err(|e| e.within(class, &property.name))?;
    }

    trace!(class, "reconstructed");
    Ok(instance)
}

fn resolve_arg(schema: &ClassSchema, property: &Property, data: &Object) -> Result<Arg, ConstructError> {
    let Some(value) = data.get_at(&property.source_path) else {
        return match &property.default {
            DefaultValue::Value(default) => Ok(Arg::Value(default.clone())),
            DefaultValue::Missing | DefaultValue::FromType => {
                Err(ConstructError::new(ConstructErrorKind::MissingValue)
                    .within(schema.class(), &property.name))
            }
        };
    };

    match &property.ty {
        Type::Class(nested) if value.is_object() => reconstruct_instance(nested, data)
            .map(Arg::Instance)
            .map_err(|e| e.within(schema.class(), &property.name)),
        _ => Ok(Arg::Value(value.clone())),
    }
}

/// Build a `T` through its facet shape from `data`, which must have been
/// flattened with `schema`.
///
/// Absent fields take their declared default, or the type's own default
/// when the field has `#[facet(default)]`.
pub fn reconstruct_reflected<T: Facet<'static>>(
    schema: &ClassSchema,
    data: &Object,
) -> Result<T, ConstructError> {
    let class = schema.class();
    if !matches!(schema.builder(), ClassBuilder::Shape(shape) if shape.is_type::<T>()) {
        return Err(not_an_instance(T::SHAPE.type_identifier).in_class(class));
    }

    let partial = Partial::alloc::<T>().map_err(|e| reflect_error(e).in_class(class))?;
    let partial = fill_struct(schema, Lookup::Tree(data), partial)?;
    let value = partial.build().map_err(|e| reflect_error(e).in_class(class))?;
    let instance = value
        .materialize::<T>()
        .map_err(|e| reflect_error(e).in_class(class))?;

    trace!(class, "reconstructed by reflection");
    Ok(instance)
}

/// Where property values are read from.
#[derive(Clone, Copy)]
enum Lookup<'a> {
    /// The whole data tree, by absolute path.
    Tree(&'a Object),
    /// One array element, by the path segments below its wildcard.
    Element { item: &'a Value, depth: usize },
}

impl<'a> Lookup<'a> {
    fn get(self, path: &SourcePath) -> Option<&'a Value> {
        match self {
            Lookup::Tree(data) => data.get_at(path),
            Lookup::Element { item, depth } => path
                .segments()
                .iter()
                .skip(depth)
                .try_fold(item, |value, segment| value.child(segment)),
        }
    }
}

fn fill_struct<'p>(
    schema: &ClassSchema,
    lookup: Lookup<'_>,
    partial: Partial<'p>,
) -> Result<Partial<'p>, ConstructError> {
    let class = schema.class();
    let shape = partial.shape();
    let ShapeType::User(UserType::Struct(struct_type)) = &shape.ty else {
        return Err(not_an_instance(class).in_class(shape.type_identifier));
    };

    let mut partial = partial;
    for (index, field) in struct_type.fields.iter().enumerate() {
        let at_field = |e: ConstructError| e.within(class, field.name);
        let property = schema
            .properties()
            .iter()
            .find(|p| p.name == field.name && p.role != Role::ValidationOnly)
            .ok_or_else(|| at_field(ConstructError::new(ConstructErrorKind::UnknownField)))?;

        let value = match lookup.get(&property.source_path) {
            Some(value) => value,
            None => match &property.default {
                DefaultValue::Value(default) => default,
                DefaultValue::FromType => {
                    partial = partial
                        .set_nth_field_to_default(index)
                        .map_err(|e| at_field(reflect_error(e)))?;
                    continue;
                }
                DefaultValue::Missing => {
                    return Err(at_field(ConstructError::new(ConstructErrorKind::MissingValue)));
                }
            },
        };

        partial = partial
            .begin_field(field.name)
            .map_err(|e| at_field(reflect_error(e)))?;
        partial = write_value(property, &property.ty, value, lookup, partial).map_err(at_field)?;
        partial = partial.end().map_err(|e| at_field(reflect_error(e)))?;
    }
    Ok(partial)
}

fn write_value<'p>(
    property: &Property,
    ty: &Type,
    value: &Value,
    lookup: Lookup<'_>,
    partial: Partial<'p>,
) -> Result<Partial<'p>, ConstructError> {
    let mut partial = partial;
    let shape = partial.shape();

    if let Def::Option(_) = shape.def {
        if value.is_null() {
            return partial.set_default().map_err(reflect_error);
        }
        partial = partial.begin_some().map_err(reflect_error)?;
        partial = write_value(property, ty, value, lookup, partial)?;
        return partial.end().map_err(reflect_error);
    }

    match (ty, value) {
        (Type::Class(nested), Value::Object(_)) => fill_struct(nested, lookup, partial),
        (Type::Array(element), Value::Array(items)) if matches!(shape.def, Def::List(_)) => {
            // element classes were resolved below `path.*`
            let depth = property.source_path.segments().len() + 1;
            partial = partial.init_list().map_err(reflect_error)?;
            for item in items {
                partial = partial.begin_list_item().map_err(reflect_error)?;
                partial = write_element(element, item, depth, partial)?;
                partial = partial.end().map_err(reflect_error)?;
            }
            Ok(partial)
        }
        (Type::Class(_) | Type::Array(_), _) => {
            Err(ConstructError::mismatch(shape.type_identifier, value))
        }
        _ => write_scalar(value, partial),
    }
}

fn write_element<'p>(
    ty: &Type,
    item: &Value,
    depth: usize,
    partial: Partial<'p>,
) -> Result<Partial<'p>, ConstructError> {
    match (ty, item) {
        (Type::Class(nested), Value::Object(_)) => {
            fill_struct(nested, Lookup::Element { item, depth }, partial)
        }
        (Type::Array(inner), Value::Array(items)) => {
            let mut partial = partial.init_list().map_err(reflect_error)?;
            for item in items {
                partial = partial.begin_list_item().map_err(reflect_error)?;
                partial = write_element(inner, item, depth + 1, partial)?;
                partial = partial.end().map_err(reflect_error)?;
            }
            Ok(partial)
        }
        _ => write_scalar(item, partial),
    }
}

fn write_scalar<'p>(value: &Value, partial: Partial<'p>) -> Result<Partial<'p>, ConstructError> {
    let shape = partial.shape();
    let written = match value {
        Value::Enum(selected) if matches!(shape.ty, ShapeType::User(UserType::Enum(_))) => {
            partial.select_variant_named(&selected.case)
        }
        Value::Date(date) if shape.is_type::<DateTime<FixedOffset>>() => partial.set(*date),
        Value::File(file) if shape.is_type::<FileHandle>() => partial.set(file.clone()),
        Value::String(s) => match shape.scalar_type() {
            Some(ScalarType::String) => partial.set(s.clone()),
            Some(ScalarType::CowStr) => partial.set(Cow::<'static, str>::Owned(s.clone())),
            _ => return Err(ConstructError::mismatch(shape.type_identifier, value)),
        },
        Value::Bool(b) if shape.scalar_type() == Some(ScalarType::Bool) => partial.set(*b),
        Value::Integer(n) => return write_integer(*n, partial),
        Value::Float(x) => match shape.scalar_type() {
            Some(ScalarType::F64) => partial.set(*x),
            Some(ScalarType::F32) => partial.set(*x as f32),
            _ => return Err(ConstructError::mismatch(shape.type_identifier, value)),
        },
        _ => return Err(ConstructError::mismatch(shape.type_identifier, value)),
    };
    written.map_err(reflect_error)
}

fn write_integer<'p>(n: i64, partial: Partial<'p>) -> Result<Partial<'p>, ConstructError> {
    let shape = partial.shape();
    let out_of_range = || {
        ConstructError::new(ConstructErrorKind::OutOfRange {
            value: n,
            target: shape.type_identifier.to_string(),
        })
    };
    let written = match shape.scalar_type() {
        Some(ScalarType::I64) => partial.set(n),
        Some(ScalarType::I32) => partial.set(i32::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::I16) => partial.set(i16::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::I8) => partial.set(i8::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::ISize) => partial.set(isize::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::U64) => partial.set(u64::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::U32) => partial.set(u32::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::U16) => partial.set(u16::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::U8) => partial.set(u8::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::USize) => partial.set(usize::try_from(n).map_err(|_| out_of_range())?),
        Some(ScalarType::F64) => partial.set(n as f64),
        Some(ScalarType::F32) => partial.set(n as f32),
        _ => {
            return Err(ConstructError::mismatch(
                shape.type_identifier,
                &Value::Integer(n),
            ));
        }
    };
    written.map_err(reflect_error)
}

fn reflect_error(err: ReflectError) -> ConstructError {
    ConstructError::new(ConstructErrorKind::Reflect(err.to_string()))
}

fn not_an_instance(expected: &str) -> ConstructError {
    ConstructError::new(ConstructErrorKind::NotAnInstance {
        expected: expected.to_string(),
    })
}
