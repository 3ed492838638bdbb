//! The closed set of root segments.

use core::fmt;
use core::str::FromStr;

/// A root segment: either a raw request data bucket or the computed
/// request-object origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// Query string and body merged into one view.
    Input,
    /// Query string only.
    Query,
    /// Request body only.
    Body,
    /// Request headers, keyed by normalized header name.
    Header,
    /// Uploaded files.
    File,
    /// Values computed from the request object by an accessor rather than
    /// looked up by key.
    Request,
}

impl Origin {
    /// Every origin, in bucket order.
    pub const ALL: [Origin; 6] = [
        Origin::Input,
        Origin::Query,
        Origin::Body,
        Origin::Header,
        Origin::File,
        Origin::Request,
    ];

    /// The segment naming this origin.
    pub const fn as_str(self) -> &'static str {
        match self {
            Origin::Input => "input",
            Origin::Query => "query",
            Origin::Body => "body",
            Origin::Header => "header",
            Origin::File => "file",
            Origin::Request => "request",
        }
    }

    /// Whether values under this origin are computed rather than looked up.
    pub const fn is_computed(self) -> bool {
        matches!(self, Origin::Request)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a segment does not name an [`Origin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOrigin;

impl fmt::Display for UnknownOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown origin")
    }
}

impl core::error::Error for UnknownOrigin {}

impl FromStr for Origin {
    type Err = UnknownOrigin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Origin::ALL
            .into_iter()
            .find(|origin| origin.as_str() == s)
            .ok_or(UnknownOrigin)
    }
}
