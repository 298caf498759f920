use patchwire_protocol::{DecodeError, Tag};
use thiserror::Error;

use crate::host::HostError;

/// A patch that disagrees with the shape of the live tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("patch expects a single root, the live root is a list")]
    NotSingle,
    #[error("patch expects a list root, the live root is a single node")]
    NotList,
    #[error("patch expects an element, found a text node")]
    NotElement,
    #[error("patch expects <{expected}>, found {found}")]
    TagMismatch { expected: Tag, found: String },
    #[error("source index {index} out of bounds for list of length {len}")]
    SourceOutOfBounds { index: usize, len: usize },
    #[error("source index {index} taken twice")]
    SourceTaken { index: usize },
    #[error("in-place op at {index} past the end of a list of length {len}")]
    NopOutOfBounds { index: usize, len: usize },
    #[error("entry index {index} does not follow {previous}")]
    EntryOrder { index: usize, previous: usize },
    #[error("entry index {index} leaves a gap after length {len}")]
    EntryGap { index: usize, len: usize },
    #[error("entry {index} patches an element that does not exist")]
    EntryNotElement { index: usize },
    #[error("entries produced length {actual}, expected {expected}")]
    EntryLength { expected: usize, actual: usize },
    #[error("cannot truncate list of length {current} to {len}")]
    TruncateBeyondEnd { len: usize, current: usize },
    #[error("nothing is mounted")]
    NotMounted,
}

/// Error taxonomy used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Truncated or trailing bytes, unknown tags, oversized messages.
    Framing,
    /// Malformed UTF-8.
    Content,
    /// The patch and the live tree are out of sync.
    StructuralMismatch,
    /// The host refused an operation.
    Host,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("structural mismatch: {0}")]
    Mismatch(#[from] Mismatch),
    #[error("host error: {0}")]
    Host(#[from] HostError),
    #[error("message of {len} bytes exceeds the {max} byte limit")]
    MessageTooLarge { len: usize, max: usize },
    #[error("core is busy")]
    CoreBusy,
}

impl RenderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RenderError::Decode(err) if err.is_content_error() => ErrorClass::Content,
            RenderError::Decode(_) | RenderError::MessageTooLarge { .. } => ErrorClass::Framing,
            RenderError::Mismatch(_) => ErrorClass::StructuralMismatch,
            RenderError::Host(_) | RenderError::CoreBusy => ErrorClass::Host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwire_buffers::BufferError;

    #[test]
    fn classes() {
        let framing = RenderError::from(DecodeError::Buffer(BufferError::TrailingBytes(1)));
        assert_eq!(framing.class(), ErrorClass::Framing);
        let unknown = RenderError::from(DecodeError::UnknownTag { grammar: "node", tag: 9 });
        assert_eq!(unknown.class(), ErrorClass::Framing);
        let content = RenderError::from(DecodeError::Buffer(BufferError::InvalidUtf8));
        assert_eq!(content.class(), ErrorClass::Content);
        assert_eq!(
            RenderError::from(Mismatch::NotList).class(),
            ErrorClass::StructuralMismatch
        );
        assert_eq!(
            RenderError::MessageTooLarge { len: 2, max: 1 }.class(),
            ErrorClass::Framing
        );
    }

    #[test]
    fn messages() {
        let err = Mismatch::TagMismatch {
            expected: Tag::Span,
            found: "<div>".into(),
        };
        assert_eq!(err.to_string(), "patch expects <span>, found <div>");
    }
}
