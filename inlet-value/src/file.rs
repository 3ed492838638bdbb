use alloc::string::String;

use bytes::Bytes;
use facet::Facet;

/// An uploaded file. Never cast; carried through the data tree as-is.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct FileHandle {
    name: String,
    media_type: Option<String>,
    contents: Bytes,
}

impl FileHandle {
    /// A file with the given client-side name and contents.
    pub fn new(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            contents: contents.into(),
        }
    }

    /// Attach the media type the client declared for this file.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// The name the client gave this file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared media type, if any.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// The file contents.
    pub fn contents(&self) -> &Bytes {
        &self.contents
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_handles_are_reflectable() {
        let shape = FileHandle::SHAPE;
        assert_eq!(shape.type_identifier, "FileHandle");
        assert!(shape.is_type::<FileHandle>());
    }
}
