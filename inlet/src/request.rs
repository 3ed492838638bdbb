//! The request object, as seen by the mapper.

use heck::ToSnakeCase;
use inlet_value::{FileHandle, Object, Value};

/// Normalize a header name the way header-sourced keys are normalized:
/// `Content-Type` and `content-type` both become `content_type`.
///
/// Lowercasing first keeps runs of capitals together, so `ETag` and `etag`
/// agree.
pub fn normalize_header_name(name: &str) -> String {
    name.to_ascii_lowercase().to_snake_case()
}

/// Raw request data buckets plus the few request-object facts accessors need.
///
/// Header bucket keys must already be normalized with
/// [`normalize_header_name`].
pub trait RequestData {
    /// The request method, e.g. `GET`.
    fn method(&self) -> &str;

    /// Query string parameters.
    fn query(&self) -> &Object;

    /// Parsed body parameters.
    fn body(&self) -> &Object;

    /// Headers, keyed by normalized name.
    fn headers(&self) -> &Object;

    /// Uploaded files.
    fn files(&self) -> &Object;

    /// Query and body merged (body wins), then files.
    fn input(&self) -> Object {
        let mut input = self.query().clone();
        input.merge(self.body().clone());
        input.merge(self.files().clone());
        input
    }

    /// A header value by name, in any spelling. Multi-valued headers yield
    /// their first value.
    fn header(&self, name: &str) -> Option<&str> {
        match self.headers().get(&normalize_header_name(name))? {
            Value::Array(values) => values.first().and_then(Value::as_str),
            value => value.as_str(),
        }
    }

    /// Whether this is an `XMLHttpRequest`.
    fn is_ajax(&self) -> bool {
        self.header("X-Requested-With") == Some("XMLHttpRequest")
    }

    /// Whether the body is JSON.
    fn is_json(&self) -> bool {
        self.header("Content-Type")
            .is_some_and(|ct| ct.contains("/json") || ct.contains("+json"))
    }
}

/// An in-memory request.
///
/// ```
/// use inlet::{RequestData, RequestSnapshot};
///
/// let request = RequestSnapshot::post()
///     .with_query([("page", "2")])
///     .with_json_body(serde_json::json!({ "name": "A" }))
///     .with_header("X-Requested-With", "XMLHttpRequest");
///
/// assert!(request.is_ajax());
/// assert_eq!(request.input().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSnapshot {
    method: String,
    query: Object,
    body: Object,
    headers: Object,
    files: Object,
}

impl RequestSnapshot {
    /// An empty request with the given method.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// An empty `GET` request.
    pub fn get() -> Self {
        Self::new("GET")
    }

    /// An empty `POST` request.
    pub fn post() -> Self {
        Self::new("POST")
    }

    /// Add query parameters.
    pub fn with_query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.query.extend(params);
        self
    }

    /// Add body parameters.
    pub fn with_body(mut self, body: Object) -> Self {
        self.body.merge(body);
        self
    }

    /// Add the members of a JSON object body. Other JSON values are ignored.
    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        if let Value::Object(body) = Value::from(body) {
            self.body.merge(body);
        }
        self
    }

    /// Add a header. Repeated names collect into an array.
    pub fn with_header(mut self, name: &str, value: impl Into<Value>) -> Self {
        let key = normalize_header_name(name);
        let value = value.into();
        match self.headers.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.headers.insert(key, value);
            }
        }
        self
    }

    /// Attach an uploaded file under `field`.
    pub fn with_file(mut self, field: impl Into<String>, file: FileHandle) -> Self {
        self.files.insert(field, file);
        self
    }
}

impl RequestData for RequestSnapshot {
    fn method(&self) -> &str {
        &self.method
    }

    fn query(&self) -> &Object {
        &self.query
    }

    fn body(&self) -> &Object {
        &self.body
    }

    fn headers(&self) -> &Object {
        &self.headers
    }

    fn files(&self) -> &Object {
        &self.files
    }
}
