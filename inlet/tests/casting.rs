mod common;

use common::*;
use inlet::{
    Arguments, ClassDecl, ConstructError, Mappable, Object, Registry, RequestSnapshot, Value,
};

fn listing_request(price: &str) -> RequestSnapshot {
    RequestSnapshot::get().with_query([
        ("url", "https://x"),
        ("name", "lamp"),
        ("price", price),
    ])
}

#[test]
fn numeric_strings_become_floats() {
    inlet_testhelpers::setup();

    let listing: Listing = mapper(Registry::new().with_type::<Listing>())
        .map(&listing_request("9.99"))
        .unwrap();
    assert_eq!(
        listing,
        Listing {
            url: "https://x".into(),
            name: "lamp".into(),
            price: 9.99,
        }
    );
}

/// Never built: every request it sees is invalid.
#[derive(Debug)]
struct Unreachable;

impl Mappable for Unreachable {
    const CLASS: &'static str = "Unreachable";

    fn declare(decl: &mut ClassDecl) {
        decl.param("url", "string");
        decl.param("name", "string");
        decl.param("price", "float");
    }

    fn construct(_args: &mut Arguments) -> Result<Self, ConstructError> {
        panic!("rejected requests must not reach construction")
    }
}

#[test]
fn uncastable_values_fail_validation_before_construction() {
    inlet_testhelpers::setup();

    let mapper = mapper(Registry::new().with_class::<Unreachable>());
    let err = mapper
        .map_declared::<Unreachable>(&listing_request("9.99.9"))
        .unwrap_err();

    let violations = violations(err);
    assert_eq!(violations.paths().collect::<Vec<_>>(), ["input.price"]);
    assert_eq!(violations.get("input.price"), Some(&["must be numeric".to_string()][..]));
}

#[test]
fn failed_casts_keep_the_raw_value() {
    inlet_testhelpers::setup();

    let mapper = mapper(Registry::new().with_type::<Listing>());
    let schema = mapper.resolve("Listing").unwrap();
    let mapping = mapper.flatten_and_cast(&schema, &listing_request("9.99.9"));

    assert_eq!(
        mapping.data.get_path(&["input", "price"]),
        Some(&Value::from("9.99.9"))
    );
    // the query bucket itself is never cast
    assert_eq!(
        mapping.data.get_path(&["query", "price"]),
        Some(&Value::from("9.99.9"))
    );
}

#[test]
fn absent_values_only_report_required() {
    inlet_testhelpers::setup();

    let mapper = mapper(Registry::new().with_type::<Listing>());

    let request = RequestSnapshot::get().with_query([("url", "https://x"), ("price", "1")]);
    let err = mapper.map::<Listing>(&request).unwrap_err();
    insta::assert_snapshot!(render(&violations(err)), @"input.name: is required");

    let request = RequestSnapshot::get().with_query([("url", "https://x"), ("name", ""), ("price", "1")]);
    let err = mapper.map::<Listing>(&request).unwrap_err();
    insta::assert_snapshot!(render(&violations(err)), @"input.name: is required");
}

#[derive(Debug)]
struct Envelope {
    meta: Value,
    note: Option<String>,
}

impl Mappable for Envelope {
    const CLASS: &'static str = "Envelope";

    fn declare(decl: &mut ClassDecl) {
        decl.untyped_param("meta");
        decl.param("note", "string").default_value(Value::Null);
    }

    fn construct(args: &mut Arguments) -> Result<Self, ConstructError> {
        Ok(Self {
            meta: args.next_value()?,
            note: args.next_value()?,
        })
    }
}

#[test]
fn untyped_values_pass_through() {
    inlet_testhelpers::setup();

    let mapper = mapper(Registry::new().with_class::<Envelope>());
    let schema = mapper.resolve("Envelope").unwrap();
    let mapping = mapper.flatten_and_cast(&schema, &RequestSnapshot::post());
    insta::assert_snapshot!(mapping.rules, @r"
    input.meta: required
    input.note: string
    ");

    let request = RequestSnapshot::post().with_json_body(serde_json::json!({
        "meta": { "tags": ["a", 1], "deep": { "ok": true } }
    }));
    let envelope: Envelope = mapper.map_declared(&request).unwrap();

    let mut expected = Object::new();
    expected.insert("tags", Value::Array(vec!["a".into(), 1i64.into()]));
    expected.set_path(&["deep", "ok"], true);
    assert_eq!(envelope.meta, Value::Object(expected));
    assert_eq!(envelope.note, None);
}
