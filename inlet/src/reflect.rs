//! Declarations read off facet shapes.
//!
//! A struct deriving `Facet` is a class: every field becomes a constructor
//! parameter typed after its Rust type, and `#[facet(inlet::...)]` attributes
//! (see [`Attr`]) say where its value comes from and which extra rules apply.
//! `Option` fields default to null, fields with `#[facet(default)]` default to
//! whatever the type supplies, and everything else is required.
//!
//! ```
//! use facet::Facet;
//! use inlet::{Origin, Rule, declaration_of};
//!
//! #[derive(Facet)]
//! struct Search {
//!     #[facet(inlet::source = "query", inlet::key = "q")]
//!     term: String,
//!     #[facet(inlet::rules = "gt:0")]
//!     page: Option<u32>,
//! }
//!
//! let decl = declaration_of(Search::SHAPE).unwrap();
//! let term = &decl.params()[0];
//! assert_eq!(term.meta().source(), Some(Origin::Query));
//! assert_eq!(term.meta().key(), Some("q"));
//! assert_eq!(decl.params()[1].meta().rules(), [Rule::Gt(0.0)]);
//! ```

use chrono::{DateTime, FixedOffset};
use facet::{Def, Field, ScalarType, Shape, StructKind, Type as ShapeType, UserType};
use inlet_path::Origin;
use inlet_value::{FileHandle, Value};

use crate::{
    Ajax, Attr, Backing, ClassDecl, ContentType, EnumCase, EnumDef, Header, Key, MemberDecl,
    Method, Rule, SchemaError, Source,
};

const NS: &str = "inlet";

/// The declaration table of a struct shape.
pub fn declaration_of(shape: &'static Shape) -> Result<ClassDecl, SchemaError> {
    let class = shape.type_identifier;
    let ShapeType::User(UserType::Struct(struct_type)) = &shape.ty else {
        return Err(invalid_shape(shape, "only structs map to classes"));
    };

    let mut decl = ClassDecl::new(class);
    let mut accepts = Vec::new();
    for attr in inlet_attrs(shape.attributes) {
        match attr.key {
            "ajax" => {
                decl.constraint(Ajax::new());
            }
            "accepts" => accepts.push(string_payload(shape, attr)?),
            other => {
                return Err(invalid_shape(
                    shape,
                    format!("`inlet::{other}` does not apply to a struct"),
                ));
            }
        }
    }
    if !accepts.is_empty() {
        decl.constraint(ContentType::must_be(accepts));
    }

    for field in struct_type.fields {
        let field_shape = field.shape();
        let member = match type_name_of(field_shape) {
            Some(type_name) => decl.param(field.name, &type_name),
            None => decl.untyped_param(field.name),
        };
        if field.has_default() {
            member.default_from_type();
        } else if matches!(field_shape.def, Def::Option(_)) {
            member.default_value(Value::Null);
        }
        apply_field_attrs(shape, field, member)?;
    }
    Ok(decl)
}

/// The enum definition of an enum shape.
///
/// Unit enums match case names. With `#[facet(inlet::discriminant)]` cases
/// match their discriminants; with `inlet::backing` on every variant they
/// match those strings.
pub fn enum_def_of(shape: &'static Shape) -> Result<EnumDef, SchemaError> {
    let ShapeType::User(UserType::Enum(enum_type)) = &shape.ty else {
        return Err(invalid_shape(shape, "not an enum"));
    };
    let by_discriminant = inlet_attrs(shape.attributes).any(|attr| attr.key == "discriminant");

    let mut cases = Vec::with_capacity(enum_type.variants.len());
    for variant in enum_type.variants {
        if variant.data.kind != StructKind::Unit {
            return Err(invalid_shape(
                shape,
                format!("variant `{}` carries data", variant.name),
            ));
        }
        let backing = if by_discriminant {
            let discriminant = variant.discriminant.ok_or_else(|| {
                invalid_shape(shape, format!("variant `{}` has no discriminant", variant.name))
            })?;
            Some(Backing::Int(discriminant))
        } else {
            match inlet_attrs(variant.attributes).find(|attr| attr.key == "backing") {
                Some(attr) => Some(Backing::Str(string_payload(shape, attr)?.to_string())),
                None => None,
            }
        };
        cases.push(EnumCase {
            name: variant.name.to_string(),
            backing,
        });
    }

    let backed = cases.iter().filter(|case| case.backing.is_some()).count();
    if backed != 0 && backed != cases.len() {
        return Err(invalid_shape(shape, "some variants lack `inlet::backing`"));
    }
    Ok(EnumDef {
        name: shape.type_identifier.to_string(),
        cases,
    })
}

/// The type name a shape is declared with, or `None` for untyped values.
pub(crate) fn type_name_of(shape: &'static Shape) -> Option<String> {
    match &shape.def {
        Def::Option(option) => return type_name_of(option.t),
        Def::List(list) => return type_name_of(list.t).map(|element| format!("{element}[]")),
        _ => {}
    }
    if shape.is_type::<DateTime<FixedOffset>>() {
        return Some("date".into());
    }
    if shape.is_type::<FileHandle>() {
        return Some("file".into());
    }
    if let Some(scalar) = shape.scalar_type() {
        return scalar_type_name(scalar).map(str::to_string);
    }
    match &shape.ty {
        ShapeType::User(UserType::Struct(_) | UserType::Enum(_)) => {
            Some(shape.type_identifier.to_string())
        }
        _ => None,
    }
}

fn scalar_type_name(scalar: ScalarType) -> Option<&'static str> {
    let name = match scalar {
        ScalarType::Bool => "bool",
        ScalarType::Str | ScalarType::String | ScalarType::CowStr => "string",
        ScalarType::F32 | ScalarType::F64 => "float",
        ScalarType::U8
        | ScalarType::U16
        | ScalarType::U32
        | ScalarType::U64
        | ScalarType::USize
        | ScalarType::I8
        | ScalarType::I16
        | ScalarType::I32
        | ScalarType::I64
        | ScalarType::ISize => "int",
        _ => return None,
    };
    Some(name)
}

/// Struct and enum shapes a shape refers to, through options and lists.
pub(crate) fn nested_user_shape(shape: &'static Shape) -> Option<&'static Shape> {
    match &shape.def {
        Def::Option(option) => return nested_user_shape(option.t),
        Def::List(list) => return nested_user_shape(list.t),
        _ => {}
    }
    if shape.is_type::<FileHandle>() || shape.is_type::<DateTime<FixedOffset>>() {
        return None;
    }
    match &shape.ty {
        ShapeType::User(UserType::Struct(_) | UserType::Enum(_)) => Some(shape),
        _ => None,
    }
}

fn apply_field_attrs(
    shape: &'static Shape,
    field: &Field,
    member: &mut MemberDecl,
) -> Result<(), SchemaError> {
    for attr in inlet_attrs(field.attributes) {
        match attr.key {
            "source" => {
                let origin = string_payload(shape, attr)?;
                let origin: Origin = origin.parse().map_err(|_| {
                    invalid_shape(
                        shape,
                        format!("unknown origin `{origin}` on `{}`", field.name),
                    )
                })?;
                member.attr(Source::new(origin));
            }
            "key" => {
                member.attr(Key::new(string_payload(shape, attr)?));
            }
            "header" => {
                member.attr(Header::new(string_payload(shape, attr)?));
            }
            "ajax" => {
                member.attr(Ajax::new());
            }
            "method" => {
                member.attr(Method);
            }
            "rules" => {
                let tokens = string_payload(shape, attr)?;
                for token in tokens.split('|').filter(|token| !token.is_empty()) {
                    member.attr(Rule::parse(token));
                }
            }
            other => {
                return Err(invalid_shape(
                    shape,
                    format!("`inlet::{other}` does not apply to field `{}`", field.name),
                ));
            }
        }
    }
    Ok(())
}

fn inlet_attrs(attrs: &'static [facet::Attr]) -> impl Iterator<Item = &'static facet::Attr> {
    attrs.iter().filter(|attr| attr.ns == Some(NS))
}

/// The string an attribute was given.
fn string_payload(
    shape: &'static Shape,
    attr: &'static facet::Attr,
) -> Result<&'static str, SchemaError> {
    let payload = match attr.get_as::<Attr>() {
        Some(
            Attr::Source(s)
            | Attr::Key(s)
            | Attr::Header(s)
            | Attr::Accepts(s)
            | Attr::Rules(s)
            | Attr::Backing(s),
        ) => Some(*s),
        Some(_) => None,
        None => attr.get_as::<&'static str>().copied(),
    };
    payload.ok_or_else(|| invalid_shape(shape, format!("`inlet::{}` needs a string", attr.key)))
}

fn invalid_shape(shape: &Shape, detail: impl Into<String>) -> SchemaError {
    SchemaError::InvalidShape {
        type_name: shape.type_identifier.to_string(),
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use facet::Facet;

    use super::*;
    use crate::DefaultValue;

    #[derive(Facet)]
    #[facet(inlet::ajax, inlet::accepts = "application/json")]
    struct Signup {
        #[facet(inlet::header = "X-Tenant")]
        tenant: String,
        #[facet(inlet::rules = "gt:17|lt:130")]
        age: i32,
        nickname: Option<String>,
        #[facet(default)]
        tags: Vec<String>,
    }

    #[derive(Facet)]
    #[repr(u8)]
    #[facet(inlet::discriminant)]
    #[allow(dead_code)]
    enum Level {
        Low = 1,
        High = 5,
    }

    #[derive(Facet)]
    #[repr(u8)]
    #[allow(dead_code)]
    enum Format {
        #[facet(inlet::backing = "text/csv")]
        Csv,
        Json,
    }

    #[derive(Facet)]
    #[allow(dead_code)]
    struct Misplaced {
        #[facet(inlet::source = "cookie")]
        token: String,
    }

    #[test]
    fn fields_become_typed_params() {
        let decl = declaration_of(Signup::SHAPE).unwrap();
        assert_eq!(decl.class(), "Signup");

        let types: Vec<_> = decl
            .params()
            .iter()
            .map(|member| member.type_name.as_deref())
            .collect();
        assert_eq!(
            types,
            [Some("string"), Some("int"), Some("string"), Some("string[]")]
        );

        let params = decl.params();
        assert_eq!(params[0].meta().source(), Some(Origin::Header));
        assert_eq!(params[0].meta().key(), Some("x_tenant"));
        assert_eq!(params[1].meta().rules(), [Rule::Gt(17.0), Rule::Lt(130.0)]);
        assert_eq!(params[1].default, DefaultValue::Missing);
        assert_eq!(params[2].default, DefaultValue::Value(Value::Null));
        assert_eq!(params[3].default, DefaultValue::FromType);
    }

    #[test]
    fn struct_attributes_become_constraints() {
        let decl = declaration_of(Signup::SHAPE).unwrap();
        let keys: Vec<_> = decl.constraints.iter().map(|meta| meta.key()).collect();
        assert_eq!(keys, [Some("ajax"), Some("content_type")]);
        assert_eq!(
            decl.constraints[1].rules(),
            [Rule::In(vec!["application/json".into()])]
        );
    }

    #[test]
    fn unknown_origins_are_rejected() {
        let err = declaration_of(Misplaced::SHAPE).err().unwrap();
        insta::assert_snapshot!(err, @"`Misplaced` cannot be mapped: unknown origin `cookie` on `token`");
    }

    #[test]
    fn discriminants_back_enums() {
        let def = enum_def_of(Level::SHAPE).unwrap();
        assert_eq!(def, EnumDef::int_backed("Level", [("Low", 1), ("High", 5)]));
    }

    #[test]
    fn partially_backed_enums_are_rejected() {
        let err = enum_def_of(Format::SHAPE).unwrap_err();
        insta::assert_snapshot!(err, @"`Format` cannot be mapped: some variants lack `inlet::backing`");
    }
}
