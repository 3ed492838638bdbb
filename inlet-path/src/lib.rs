#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

mod origin;
pub use origin::*;

/// Segment prepended to the paths of class-level constraints so they never
/// collide with the path of a real field.
pub const INTERNAL_SEGMENT: &str = "__request";

/// Segment used for "every element of this array" in rule paths.
pub const WILDCARD_SEGMENT: &str = "*";

/// Where a value lives: an ordered sequence of non-empty segments.
///
/// The string form joins segments with `.`, and parsing that string form
/// yields an equal path, so a `SourcePath` can be used interchangeably with
/// its rendering as a map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePath {
    segments: Vec<String>,
}

/// Errors produced while building a [`SourcePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment was the empty string.
    EmptySegment {
        /// The path the empty segment was being appended to, if any.
        parent: Option<String>,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::EmptySegment { parent: Some(parent) } => {
                write!(f, "empty path segment after `{parent}`")
            }
            PathError::EmptySegment { parent: None } => write!(f, "empty path segment"),
        }
    }
}

impl core::error::Error for PathError {}

impl SourcePath {
    /// A path consisting of the single segment naming `origin`.
    pub fn root(origin: Origin) -> Self {
        Self {
            segments: alloc::vec![origin.as_str().to_string()],
        }
    }

    /// Build a path from raw segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = Self {
            segments: Vec::new(),
        };
        for segment in segments {
            path.push(segment.into())?;
        }
        Ok(path)
    }

    fn push(&mut self, segment: String) -> Result<(), PathError> {
        if segment.is_empty() {
            return Err(PathError::EmptySegment {
                parent: (!self.segments.is_empty()).then(|| self.to_string()),
            });
        }
        self.segments.push(segment);
        Ok(())
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let mut path = self.clone();
        path.push(segment.into())?;
        Ok(path)
    }

    /// A new path with every segment of `other` appended.
    pub fn join(&self, other: &SourcePath) -> Self {
        let mut path = self.clone();
        path.segments.extend(other.segments.iter().cloned());
        path
    }

    /// The `path.*` form addressing every element of an array at this path.
    pub fn wildcard(&self) -> Self {
        let mut path = self.clone();
        path.segments.push(WILDCARD_SEGMENT.to_string());
        path
    }

    /// This path moved under the [`INTERNAL_SEGMENT`].
    pub fn internal(&self) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(INTERNAL_SEGMENT.to_string());
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// Whether this path lives under the [`INTERNAL_SEGMENT`].
    pub fn is_internal(&self) -> bool {
        self.segments.first().map(String::as_str) == Some(INTERNAL_SEGMENT)
    }

    /// The segments of this path, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The origin named by the first segment, if it names one.
    pub fn origin(&self) -> Option<Origin> {
        self.segments.first().and_then(|s| s.parse().ok())
    }

    /// The last segment.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path without its last segment, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether `prefix` is a (non-strict) prefix of this path.
    pub fn starts_with(&self, prefix: &SourcePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// The segments remaining after `prefix`, if `prefix` is a prefix of this path.
    pub fn strip_prefix(&self, prefix: &SourcePath) -> Option<&[String]> {
        self.segments.strip_prefix(prefix.segments.as_slice())
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for SourcePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_segments(s.split('.'))
    }
}

impl From<Origin> for SourcePath {
    fn from(origin: Origin) -> Self {
        Self::root(origin)
    }
}
