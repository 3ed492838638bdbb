//! Flattening request buckets into one tree and casting its leaves.

use inlet_path::Origin;
use inlet_value::Object;
use tracing::{debug, trace};

use crate::{CastOutcome, Caster, ClassSchema, DateParser, RequestData, Role, RuleMap, Type, derive_rules};

/// The cast data tree together with the rules it must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Buckets keyed by origin, leaves cast where possible.
    pub data: Object,
    /// Derived rules keyed by source path.
    pub rules: RuleMap,
}

/// The raw buckets of `request`, one top-level entry per origin.
pub fn collect_buckets(request: &dyn RequestData) -> Object {
    let mut data = Object::with_capacity(Origin::ALL.len());
    data.insert(Origin::Input.as_str(), request.input());
    data.insert(Origin::Query.as_str(), request.query().clone());
    data.insert(Origin::Body.as_str(), request.body().clone());
    data.insert(Origin::Header.as_str(), request.headers().clone());
    data.insert(Origin::File.as_str(), request.files().clone());
    data
}

/// Builds the cast data tree for a schema.
#[derive(Clone, Copy)]
pub struct Flattener<'a> {
    caster: Caster<'a>,
}

impl<'a> Flattener<'a> {
    /// A flattener parsing dates with `dates`.
    pub fn new(dates: &'a dyn DateParser) -> Self {
        Self {
            caster: Caster::new(dates),
        }
    }

    /// Flatten `request` and cast every value `schema` declares.
    ///
    /// Accessors run first, then class-level constraint values are copied
    /// under the internal prefix, then the remaining values are cast in
    /// place.
    pub fn flatten(&self, schema: &ClassSchema, request: &dyn RequestData) -> Object {
        let mut data = collect_buckets(request);
        run_accessors(schema, request, &mut data);
        copy_constraints(schema, &mut data);
        self.cast_in_place(schema, &mut data);
        debug!(class = schema.class(), "flattened request data");
        data
    }

    /// [`Flattener::flatten`] plus the rules of `schema`.
    pub fn flatten_and_cast(&self, schema: &ClassSchema, request: &dyn RequestData) -> Mapping {
        Mapping {
            data: self.flatten(schema, request),
            rules: derive_rules(schema),
        }
    }

    fn cast_in_place(&self, schema: &ClassSchema, data: &mut Object) {
        for property in schema.properties() {
            if property.role == Role::ValidationOnly || property.origin.is_computed() {
                continue;
            }
            if matches!(property.ty, Type::Mixed | Type::Array(_)) {
                continue;
            }
            let Some(slot) = data.get_at_mut(&property.source_path) else {
                trace!(path = %property.source_path, "absent, nothing to cast");
                continue;
            };

            let raw = slot.take();
            let typed = match self.caster.cast(&property.ty, raw) {
                CastOutcome::Typed(value) => {
                    *slot = value;
                    true
                }
                CastOutcome::Unchanged(raw) => {
                    trace!(
                        path = %property.source_path,
                        ty = %property.ty,
                        raw = %raw,
                        "cast failed, keeping the raw value"
                    );
                    *slot = raw;
                    false
                }
            };

            if let (true, Type::Class(nested)) = (typed, &property.ty) {
                self.cast_in_place(nested, data);
            }
        }
    }
}

fn run_accessors(schema: &ClassSchema, request: &dyn RequestData, data: &mut Object) {
    for property in schema.properties() {
        if let (true, Some(accessor)) = (property.origin.is_computed(), property.accessor) {
            let value = accessor.get(request);
            trace!(path = %property.source_path, accessor = accessor.name(), value = %value, "computed");
            data.set_at(&property.source_path, value);
        }
        if let Type::Class(nested) = &property.ty {
            run_accessors(nested, request, data);
        }
    }
}

fn copy_constraints(schema: &ClassSchema, data: &mut Object) {
    for property in schema.properties() {
        if property.role == Role::ValidationOnly {
            if let Some(value) = data.get_at(&property.source_path).cloned() {
                data.set_at(&property.source_path.internal(), value);
            }
        }
        if let Type::Class(nested) = &property.ty {
            copy_constraints(nested, data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Ajax, Arguments, ChronoDateParser, ConstructError, Header, Mappable, Registry, Resolver,
        RequestSnapshot, Source,
    };
    use inlet_value::Value;

    struct Listing;

    impl Mappable for Listing {
        const CLASS: &'static str = "Listing";

        fn declare(decl: &mut crate::ClassDecl) {
            decl.param("url", "string").attr(Source::query());
            decl.param("price", "float");
            decl.param("flag", "bool").attr(Header::new("X-Flag"));
            decl.untyped_param("extra").default_value(Value::Null);
            decl.constraint(Ajax::new());
        }

        fn construct(_args: &mut Arguments) -> Result<Self, ConstructError> {
            Ok(Listing)
        }
    }

    fn flatten(request: &RequestSnapshot) -> Object {
        let registry = Registry::new().with_class::<Listing>();
        let schema = Resolver::new(&registry).resolve("Listing").unwrap();
        Flattener::new(&ChronoDateParser).flatten(&schema, request)
    }

    #[test]
    fn casts_in_place_and_keeps_failures_raw() {
        let request = RequestSnapshot::get()
            .with_query([("url", "https://x"), ("price", "9.99.9")])
            .with_header("X-Flag", "true");
        let data = flatten(&request);

        assert_eq!(data.get_path(&["query", "url"]), Some(&Value::from("https://x")));
        assert_eq!(data.get_path(&["input", "price"]), Some(&Value::from("9.99.9")));
        assert_eq!(data.get_path(&["header", "x_flag"]), Some(&Value::Bool(true)));
        assert_eq!(data.get_path(&["input", "extra"]), None);
    }

    #[test]
    fn constraints_are_copied_under_the_internal_prefix() {
        let request = RequestSnapshot::get().with_header("X-Requested-With", "XMLHttpRequest");
        let data = flatten(&request);

        assert_eq!(data.get_path(&["request", "ajax"]), Some(&Value::Bool(true)));
        assert_eq!(
            data.get_path(&["__request", "request", "ajax"]),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn mixed_values_are_untouched() {
        let request = RequestSnapshot::post().with_json_body(serde_json::json!({
            "price": 3,
            "extra": { "any": ["shape", 1] }
        }));
        let data = flatten(&request);

        assert_eq!(data.get_path(&["input", "price"]), Some(&Value::Float(3.0)));
        assert_eq!(
            data.get_path(&["input", "extra", "any", "1"]),
            Some(&Value::Integer(1))
        );
    }
}
