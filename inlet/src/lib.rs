#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(macro_expanded_macro_exports_accessed_by_absolute_paths))]
#![doc = include_str!("../README.md")]

extern crate self as inlet;

pub use inlet_path::{INTERNAL_SEGMENT, Origin, PathError, SourcePath, WILDCARD_SEGMENT};
pub use inlet_value::{EnumValue, FileHandle, Object, Value, ValueType};

facet::define_attr_grammar! {
    ns "inlet";
    crate_path ::inlet;

    /// Mapping attributes, written `#[facet(inlet::...)]` on types deriving `Facet`.
    pub enum Attr {
        /// Read a field from another request bucket: `inlet::source = "query"`.
        Source(&'static str),
        /// Look a field up under another key. Dots reach into nested data.
        Key(&'static str),
        /// Read a field from a request header: `inlet::header = "X-Flag"`.
        Header(&'static str),
        /// On a struct: the `Content-Type` header must be this media type.
        /// Repeat it to accept several.
        Accepts(&'static str),
        /// On a field: whether the request is an AJAX call.
        /// On a struct: the request must be one.
        Ajax,
        /// The request method.
        Method,
        /// Extra rules, `|`-separated: `inlet::rules = "gt:9"`.
        Rules(&'static str),
        /// On an enum: cases are matched by their discriminants.
        Discriminant,
        /// On an enum variant: the string this case is matched by.
        Backing(&'static str),
    }
}

mod types;
pub use types::*;

mod rule;
pub use rule::*;

mod decl;
pub use decl::*;

mod attrs;
pub use attrs::*;

mod schema;
pub use schema::*;

mod mappable;
pub use mappable::*;

mod reflect;
pub use reflect::*;

mod registry;
pub use registry::*;

mod resolve;
pub use resolve::*;

mod cache;
pub use cache::*;

mod request;
pub use request::*;

mod date;
pub use date::*;

mod cast;
pub use cast::*;

mod flatten;
pub use flatten::*;

mod validation;
pub use validation::*;

mod reconstruct;
pub use reconstruct::*;

mod mapper;
pub use mapper::*;
