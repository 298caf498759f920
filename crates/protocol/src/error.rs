use patchwire_buffers::BufferError;
use thiserror::Error;

/// Errors produced while decoding a tree, patch or event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// A selector tag outside the closed set for its grammar level.
    #[error("unknown {grammar} tag {tag}")]
    UnknownTag { grammar: &'static str, tag: u32 },
}

impl DecodeError {
    /// Returns `true` for malformed text. Everything else is a framing error.
    pub fn is_content_error(&self) -> bool {
        match self {
            DecodeError::Buffer(err) => err.is_content_error(),
            DecodeError::UnknownTag { .. } => false,
        }
    }

    pub(crate) fn unknown(grammar: &'static str, tag: u32) -> Self {
        DecodeError::UnknownTag { grammar, tag }
    }
}
