use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// The kind of the current event or token.
///
/// [`Reader::next`](crate::Reader::next) only ever reports the first five
/// kinds; the remaining kinds are surfaced by
/// [`Reader::next_token`](crate::Reader::next_token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The initial state, before the first advance.
    StartDocument,
    /// The input is exhausted. Advancing further is an error.
    EndDocument,
    /// A start tag, or the start-tag half of an empty element.
    StartTag,
    /// An end tag, or the synthetic end-tag half of an empty element.
    EndTag,
    /// Character data. In event mode this is the coalesced run of text,
    /// CDATA and resolved entity references between two structural events.
    Text,
    /// A CDATA section (token mode only).
    CData,
    /// An entity reference (token mode only).
    EntityRef,
    /// Whitespace outside the root element (token mode only).
    IgnorableWhitespace,
    /// A processing instruction (token mode only).
    ProcessingInstruction,
    /// A comment (token mode only).
    Comment,
    /// A document type declaration (token mode only).
    DocDecl,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::StartDocument => "start document",
            EventKind::EndDocument => "end document",
            EventKind::StartTag => "start tag",
            EventKind::EndTag => "end tag",
            EventKind::Text => "text",
            EventKind::CData => "CDATA section",
            EventKind::EntityRef => "entity reference",
            EventKind::IgnorableWhitespace => "ignorable whitespace",
            EventKind::ProcessingInstruction => "processing instruction",
            EventKind::Comment => "comment",
            EventKind::DocDecl => "document declaration",
        };
        f.write_str(s)
    }
}

/// An attribute of the current start tag.
///
/// Borrowed from the reader; invalidated by the next advance. Namespace
/// declarations (`xmlns`, `xmlns:*`) are not included unless the reader was
/// configured with `report_namespace_attributes`, in which case they appear
/// bound to `http://www.w3.org/2000/xmlns/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// The prefix the attribute was written with, if any.
    pub prefix: Option<&'a str>,
    /// The resolved namespace URI. `None` for unprefixed attributes, which
    /// are never in the default namespace.
    pub namespace: Option<Cow<'a, str>>,
    /// The local name.
    pub local_name: &'a str,
    /// The value, with entity and character references resolved.
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    /// The namespace URI as a plain string, with `""` meaning "no
    /// namespace".
    pub fn namespace_str(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }
}
