use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::event::EventKind;

/// A line/column position in the input, 1-based.
///
/// Captured at the moment a failure is detected, so error data does not
/// depend on parser state that may have moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub(crate) fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let mut line = 1;
        let mut line_start = 0;
        for (i, b) in text.as_bytes()[..offset].iter().enumerate() {
            if *b == b'\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        Position {
            line,
            column: text[line_start..offset].chars().count() as u32 + 1,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors surfaced by the reader, the tree builder, the writer and the
/// bridge. All are fatal; none are silently recovered.
#[derive(Debug, Error)]
pub enum Error {
    /// The current event does not match what the caller required, or a
    /// close tag does not match the element that opened the frame.
    #[error("expected {expected}, got {actual} at {position}")]
    StructuralMismatch {
        expected: String,
        actual: String,
        position: Position,
    },

    /// A prefix with no visible binding was used where one is required.
    #[error("prefix `{prefix}` is not bound to a namespace at {position}")]
    UnboundPrefix { prefix: String, position: Position },

    /// An entity reference that has no replacement text was encountered
    /// while coalescing in event mode.
    #[error("entity reference `&{0};` cannot be resolved")]
    UnresolvedEntity(String),

    /// An entity reference was not terminated by `;`.
    #[error("unclosed entity `&{0}`")]
    UnclosedEntity(String),

    /// A malformed entity or character reference.
    #[error("invalid entity `&{0};`")]
    InvalidEntity(String),

    /// The reserved `xml`/`xmlns` prefixes were declared illegally, or a
    /// prefix was declared twice on one element.
    #[error("invalid namespace declaration: {reason} at {position}")]
    InvalidDeclaration { reason: String, position: Position },

    /// The same expanded attribute name appeared twice on one element.
    #[error("duplicate attribute `{name}` at {position}")]
    DuplicatedAttribute { name: String, position: Position },

    /// An accessor was called for an event kind it is not defined on.
    #[error("`{operation}` is not valid on {kind}")]
    InvalidEventState {
        operation: &'static str,
        kind: EventKind,
    },

    /// `namespace_count` was called with a depth beyond the current one.
    #[error("namespace count requested for depth {requested}, current depth is {depth}")]
    InvalidDepth { requested: usize, depth: usize },

    /// An attribute or namespace binding index beyond the available range.
    #[error("index {index} out of bounds ({count} entries)")]
    IndexOutOfBounds { index: usize, count: usize },

    /// The reader was advanced after EndDocument was already reported.
    #[error("cannot advance past end of document")]
    PastEndOfDocument,

    /// A sink operation was called outside its valid state.
    #[error("serializer misuse: {0}")]
    SinkUsage(String),

    /// Comment text may not contain `--`.
    #[error("invalid comment: {0}")]
    InvalidComment(String),

    /// Processing instruction content may not contain `?>`.
    #[error("invalid processing instruction: {0}")]
    InvalidTarget(String),

    /// CDATA content may not contain `]]>`.
    #[error("invalid CDATA section: {0}")]
    InvalidCData(String),

    #[error("parser error: {0}")]
    Parser(#[from] xmlparser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
