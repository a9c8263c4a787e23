use std::borrow::Cow;
use std::collections::VecDeque;

use log::trace;
use xmlparser::{ElementEnd, Token, Tokenizer};

use crate::entity::{self, EntityReplacements, TextRun};
use crate::error::{Error, Position};
use crate::event::{Attribute, EventKind};
use crate::scope::{NamespaceBinding, ScopeStack, XMLNS_NAMESPACE, XML_NAMESPACE};

/// Configuration for a [`Reader`], validated at construction.
///
/// This replaces string-keyed feature lookup: every recognized option is a
/// typed field with a defined default.
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Process namespace declarations and resolve qualified names. With
    /// this off, qualified names are reported verbatim as local names and
    /// `xmlns` attributes appear as ordinary attributes.
    pub namespace_aware: bool,
    /// Report `xmlns`/`xmlns:*` attributes in the attribute list, bound to
    /// the `http://www.w3.org/2000/xmlns/` namespace.
    pub report_namespace_attributes: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            namespace_aware: true,
            report_namespace_attributes: false,
        }
    }
}

// One lexical unit from the pump, before any reader state is committed.
#[derive(Debug)]
enum Raw<'input> {
    StartTag {
        prefix: Option<&'input str>,
        local: &'input str,
        qname: &'input str,
        attrs: Vec<RawAttr<'input>>,
        empty: bool,
        pos: usize,
    },
    EndTag {
        prefix: Option<&'input str>,
        local: &'input str,
        qname: &'input str,
        pos: usize,
    },
    // synthetic close of an empty element; reuses the open frame
    EndEmptyTag,
    Text {
        text: &'input str,
        pos: usize,
    },
    EntityRef {
        name: &'input str,
        pos: usize,
    },
    // a run merged by event-mode coalescing
    Coalesced {
        text: Cow<'input, str>,
        pos: usize,
    },
    CData {
        text: &'input str,
        pos: usize,
    },
    Comment {
        text: &'input str,
        pos: usize,
    },
    Pi {
        text: &'input str,
        pos: usize,
    },
    DocDecl {
        text: &'input str,
        pos: usize,
    },
    Whitespace {
        text: &'input str,
        pos: usize,
    },
    EndDocument,
}

#[derive(Debug)]
struct RawAttr<'input> {
    prefix: Option<&'input str>,
    local: &'input str,
    qname: &'input str,
    value: &'input str,
    pos: usize,
}

// The element whose subtree is currently being read.
#[derive(Debug)]
struct Frame<'input> {
    prefix: Option<&'input str>,
    local: &'input str,
    namespace: Option<Cow<'input, str>>,
    pos: usize,
}

/// A streaming, pull-based XML event source.
///
/// The reader owns the one-event buffer and the namespace scope stack; the
/// only operations that mutate either are [`Reader::next`] and
/// [`Reader::next_token`]. Everything returned by the accessors borrows
/// from the reader and is invalidated by the next advance.
pub struct Reader<'input> {
    input: &'input str,
    tokenizer: Tokenizer<'input>,
    options: ReaderOptions,
    replacements: EntityReplacements,

    // pump state
    queue: VecDeque<Raw<'input>>,
    lookahead: Option<Raw<'input>>,
    raw_depth: usize,
    empty_end_pending: bool,

    // document metadata from the XML declaration
    version: Option<&'input str>,
    encoding: Option<&'input str>,
    standalone: Option<bool>,

    // committed state
    scope: ScopeStack<'input>,
    frames: Vec<Frame<'input>>,
    kind: EventKind,
    attrs: Vec<Attribute<'input>>,
    text: Option<Cow<'input, str>>,
    entity_name: Option<&'input str>,
    is_empty: bool,
    event_pos: usize,
    // frame/scope pop deferred while an EndTag is the current event
    end_pending: bool,
}

impl<'input> Reader<'input> {
    /// Create a reader over `input` with default options.
    pub fn new(input: &'input str) -> Self {
        Self::with_options(input, ReaderOptions::default())
    }

    /// Create a reader over `input` with explicit options.
    pub fn with_options(input: &'input str, options: ReaderOptions) -> Self {
        Reader {
            input,
            tokenizer: Tokenizer::from(input),
            options,
            replacements: EntityReplacements::default(),
            queue: VecDeque::new(),
            lookahead: None,
            raw_depth: 0,
            empty_end_pending: false,
            version: None,
            encoding: None,
            standalone: None,
            scope: ScopeStack::new(),
            frames: Vec::new(),
            kind: EventKind::StartDocument,
            attrs: Vec::new(),
            text: None,
            entity_name: None,
            is_empty: false,
            event_pos: 0,
            end_pending: false,
        }
    }

    /// Register replacement text for an entity reference, so `&name;`
    /// resolves in event mode and carries text in token mode. Entities
    /// declared in the document's internal DTD subset are registered
    /// automatically.
    pub fn define_entity_replacement(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.replacements.insert(name.into(), text.into());
    }

    /// The options this reader was constructed with.
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// The kind of the current event.
    pub fn event_kind(&self) -> EventKind {
        self.kind
    }

    /// Element nesting depth of the current event. Zero at start/end of
    /// document; an element's start and end tags report the same depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Position of the current event in the input.
    pub fn position(&self) -> Position {
        Position::from_offset(self.input, self.event_pos)
    }

    /// The version from the XML declaration, if one was present.
    pub fn xml_version(&self) -> Option<&str> {
        self.version
    }

    /// The encoding declared in the XML declaration, if any.
    pub fn declared_encoding(&self) -> Option<&str> {
        self.encoding
    }

    /// The standalone flag declared in the XML declaration, if any.
    pub fn declared_standalone(&self) -> Option<bool> {
        self.standalone
    }

    /// The prefix of the current start or end tag. `None` for unprefixed
    /// tags and for every other event kind.
    pub fn prefix(&self) -> Option<&str> {
        self.tag_frame().and_then(|f| f.prefix)
    }

    /// The namespace URI of the current start or end tag. `Some("")` means
    /// "no namespace"; `None` means the current event has no namespace at
    /// all (not a tag, or namespace processing is disabled).
    pub fn namespace(&self) -> Option<&str> {
        self.tag_frame().and_then(|f| f.namespace.as_deref())
    }

    /// The local name of the current start or end tag, or the name of the
    /// current entity reference.
    pub fn local_name(&self) -> Option<&str> {
        if self.kind == EventKind::EntityRef {
            return self.entity_name;
        }
        self.tag_frame().map(|f| f.local)
    }

    /// The text of the current event. Defined for Text, CData, Comment,
    /// ProcessingInstruction, DocDecl, IgnorableWhitespace, and for
    /// EntityRef when the reference has a known replacement.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whether the current Text, CData or IgnorableWhitespace event
    /// consists only of whitespace.
    pub fn is_whitespace(&self) -> Result<bool, Error> {
        match self.kind {
            EventKind::IgnorableWhitespace => Ok(true),
            EventKind::Text | EventKind::CData => Ok(self
                .text
                .as_deref()
                .map_or(false, |t| t.chars().all(|c| c.is_ascii_whitespace()))),
            kind => Err(Error::InvalidEventState {
                operation: "is_whitespace",
                kind,
            }),
        }
    }

    /// Whether the current start tag was written as an empty element
    /// (`<x/>`). Valid only on StartTag. Either way the matching EndTag is
    /// the next structural event.
    pub fn is_empty_element(&self) -> Result<bool, Error> {
        if self.kind != EventKind::StartTag {
            return Err(Error::InvalidEventState {
                operation: "is_empty_element",
                kind: self.kind,
            });
        }
        Ok(self.is_empty)
    }

    /// Number of attributes of the current start tag. Fatal on any other
    /// event kind.
    pub fn attribute_count(&self) -> Result<usize, Error> {
        if self.kind != EventKind::StartTag {
            return Err(Error::InvalidEventState {
                operation: "attribute_count",
                kind: self.kind,
            });
        }
        Ok(self.attrs.len())
    }

    /// The attributes of the current start tag, in document order.
    pub fn attributes(&self) -> Result<&[Attribute<'input>], Error> {
        if self.kind != EventKind::StartTag {
            return Err(Error::InvalidEventState {
                operation: "attributes",
                kind: self.kind,
            });
        }
        Ok(&self.attrs)
    }

    /// The attribute at `index` of the current start tag.
    pub fn attribute(&self, index: usize) -> Result<&Attribute<'input>, Error> {
        let attrs = self.attributes()?;
        attrs.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: attrs.len(),
        })
    }

    /// Number of namespace bindings visible at `depth`. Monotonically
    /// non-decreasing in `depth`; fatal when `depth` exceeds the current
    /// depth.
    pub fn namespace_count(&self, depth: usize) -> Result<usize, Error> {
        if !self.options.namespace_aware {
            return if depth <= self.depth() {
                Ok(0)
            } else {
                Err(Error::InvalidDepth {
                    requested: depth,
                    depth: self.depth(),
                })
            };
        }
        self.scope.count_at(depth).ok_or(Error::InvalidDepth {
            requested: depth,
            depth: self.depth(),
        })
    }

    /// The namespace binding at `pos`, counting from the outermost. The
    /// bindings introduced by the element at depth `d` occupy positions
    /// `namespace_count(d - 1)..namespace_count(d)`.
    pub fn namespace_binding(&self, pos: usize) -> Result<NamespaceBinding<'input>, Error> {
        let count = self.namespace_count(self.depth())?;
        self.scope
            .binding(pos)
            .ok_or(Error::IndexOutOfBounds { index: pos, count })
    }

    /// Resolve a prefix against the bindings currently in scope. `None`
    /// means unbound, which is not an error by itself.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.scope.resolve(prefix)
    }

    /// Advance in event mode: only StartDocument, EndDocument, StartTag,
    /// EndTag and Text are ever reported. Adjacent text, CDATA and
    /// resolved entity references are merged into one Text event;
    /// comments, processing instructions and ignorable whitespace are
    /// skipped. An entity reference with no known replacement is fatal
    /// here.
    pub fn next(&mut self) -> Result<EventKind, Error> {
        if self.kind == EventKind::EndDocument {
            return Err(Error::PastEndOfDocument);
        }
        let mut pending: Option<(Cow<'input, str>, usize)> = None;
        loop {
            let raw = match self.lookahead.take() {
                Some(raw) => raw,
                None => self.read_raw()?,
            };
            match raw {
                Raw::Comment { .. }
                | Raw::Pi { .. }
                | Raw::DocDecl { .. }
                | Raw::Whitespace { .. } => continue,
                Raw::Text { text, pos } => {
                    append_run(&mut pending, Cow::Borrowed(text), pos);
                }
                Raw::CData { text, pos } => {
                    append_run(&mut pending, Cow::Borrowed(text), pos);
                }
                Raw::EntityRef { name, pos } => {
                    match entity::replacement(name, &self.replacements)? {
                        Some(replacement) => {
                            append_run(&mut pending, Cow::Owned(replacement.into_owned()), pos)
                        }
                        None => return Err(Error::UnresolvedEntity(name.to_string())),
                    }
                }
                raw @ (Raw::StartTag { .. }
                | Raw::EndTag { .. }
                | Raw::EndEmptyTag
                | Raw::EndDocument) => {
                    if let Some((text, pos)) = pending.take() {
                        self.lookahead = Some(raw);
                        return self.commit(Raw::Coalesced { text, pos });
                    }
                    return self.commit(raw);
                }
                Raw::Coalesced { .. } => unreachable!("coalesced runs are never queued"),
            }
        }
    }

    /// Advance in token mode: every lexical unit is reported individually,
    /// including comments, processing instructions, CDATA sections, entity
    /// references, the document type declaration, and whitespace outside
    /// the root element.
    pub fn next_token(&mut self) -> Result<EventKind, Error> {
        if self.kind == EventKind::EndDocument {
            return Err(Error::PastEndOfDocument);
        }
        let raw = match self.lookahead.take() {
            Some(raw) => raw,
            None => self.read_raw()?,
        };
        self.commit(raw)
    }

    /// Assert that the current event matches `kind` and, when given, the
    /// expected namespace and name (`None` acts as a wildcard). As a
    /// single convenience, a whitespace-only Text event is skipped first
    /// when something other than Text is expected.
    pub fn require(
        &mut self,
        kind: EventKind,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Result<(), Error> {
        if self.kind == EventKind::Text
            && kind != EventKind::Text
            && self.is_whitespace().unwrap_or(false)
        {
            self.next()?;
        }
        let matches = self.kind == kind
            && namespace.map_or(true, |ns| self.namespace() == Some(ns))
            && name.map_or(true, |n| self.local_name() == Some(n));
        if matches {
            Ok(())
        } else {
            Err(Error::StructuralMismatch {
                expected: describe(kind, namespace, name),
                actual: describe(self.kind, self.namespace(), self.local_name()),
                position: self.position(),
            })
        }
    }

    fn tag_frame(&self) -> Option<&Frame<'input>> {
        match self.kind {
            EventKind::StartTag | EventKind::EndTag => self.frames.last(),
            _ => None,
        }
    }

    // ---- pump: tokenizer to raw units, no reader state committed ----

    fn read_raw(&mut self) -> Result<Raw<'input>, Error> {
        if let Some(raw) = self.queue.pop_front() {
            return Ok(raw);
        }
        if self.empty_end_pending {
            self.empty_end_pending = false;
            return Ok(Raw::EndEmptyTag);
        }
        loop {
            let token = match self.tokenizer.next() {
                Some(token) => token?,
                None => return Ok(Raw::EndDocument),
            };
            match token {
                Token::Declaration {
                    version,
                    encoding,
                    standalone,
                    ..
                } => {
                    self.version = Some(version.as_str());
                    self.encoding = encoding.map(|e| e.as_str());
                    self.standalone = standalone;
                }
                Token::ProcessingInstruction { span, .. } => {
                    let range = span.range();
                    return Ok(Raw::Pi {
                        text: &self.input[range.start + 2..range.end - 2],
                        pos: range.start,
                    });
                }
                Token::Comment { text, span } => {
                    return Ok(Raw::Comment {
                        text: text.as_str(),
                        pos: span.start(),
                    });
                }
                Token::EmptyDtd { span, .. } => {
                    let range = span.range();
                    return Ok(Raw::DocDecl {
                        text: &self.input[range.start + 9..range.end - 1],
                        pos: range.start,
                    });
                }
                Token::DtdStart { span, .. } => {
                    let start = span.start();
                    let end = self.capture_dtd(start)?;
                    return Ok(Raw::DocDecl {
                        text: &self.input[start + 9..end - 1],
                        pos: start,
                    });
                }
                Token::ElementStart {
                    prefix,
                    local,
                    span,
                } => {
                    return self.pump_element(prefix, local, span.start());
                }
                Token::ElementEnd {
                    end: ElementEnd::Close(prefix, local),
                    span,
                } => {
                    self.raw_depth = self.raw_depth.saturating_sub(1);
                    return Ok(Raw::EndTag {
                        prefix: non_empty(prefix.as_str()),
                        local: local.as_str(),
                        qname: qname_slice(self.input, prefix, local),
                        pos: span.start(),
                    });
                }
                Token::Text { text } => {
                    let pos = text.start();
                    let text = text.as_str();
                    if self.raw_depth == 0 {
                        if text.chars().all(|c| c.is_ascii_whitespace()) {
                            return Ok(Raw::Whitespace { text, pos });
                        }
                        return Err(Error::StructuralMismatch {
                            expected: "markup".to_string(),
                            actual: "text outside the root element".to_string(),
                            position: Position::from_offset(self.input, pos),
                        });
                    }
                    return self.pump_text(text, pos);
                }
                Token::Cdata { text, span } => {
                    return Ok(Raw::CData {
                        text: text.as_str(),
                        pos: span.start(),
                    });
                }
                // stray structural tokens the tokenizer never emits here
                Token::ElementEnd { span, .. } => {
                    return Err(Error::StructuralMismatch {
                        expected: "markup".to_string(),
                        actual: "element end without a start tag".to_string(),
                        position: Position::from_offset(self.input, span.start()),
                    });
                }
                _ => {}
            }
        }
    }

    // Collect the attribute tokens of one element up to its closing `>`
    // or `/>`.
    fn pump_element(
        &mut self,
        prefix: xmlparser::StrSpan<'input>,
        local: xmlparser::StrSpan<'input>,
        pos: usize,
    ) -> Result<Raw<'input>, Error> {
        let mut attrs = Vec::new();
        loop {
            let token = match self.tokenizer.next() {
                Some(token) => token?,
                None => {
                    return Err(Error::StructuralMismatch {
                        expected: "`>` or `/>`".to_string(),
                        actual: "end of document".to_string(),
                        position: Position::from_offset(self.input, self.input.len()),
                    })
                }
            };
            match token {
                Token::Attribute {
                    prefix: attr_prefix,
                    local: attr_local,
                    value,
                    span,
                } => {
                    attrs.push(RawAttr {
                        prefix: non_empty(attr_prefix.as_str()),
                        local: attr_local.as_str(),
                        qname: qname_slice(self.input, attr_prefix, attr_local),
                        value: value.as_str(),
                        pos: span.start(),
                    });
                }
                Token::ElementEnd {
                    end: ElementEnd::Open,
                    ..
                } => {
                    self.raw_depth += 1;
                    return Ok(Raw::StartTag {
                        prefix: non_empty(prefix.as_str()),
                        local: local.as_str(),
                        qname: qname_slice(self.input, prefix, local),
                        attrs,
                        empty: false,
                        pos,
                    });
                }
                Token::ElementEnd {
                    end: ElementEnd::Empty,
                    ..
                } => {
                    self.empty_end_pending = true;
                    return Ok(Raw::StartTag {
                        prefix: non_empty(prefix.as_str()),
                        local: local.as_str(),
                        qname: qname_slice(self.input, prefix, local),
                        attrs,
                        empty: true,
                        pos,
                    });
                }
                _ => {
                    return Err(Error::StructuralMismatch {
                        expected: "attribute or `>`".to_string(),
                        actual: "unexpected token".to_string(),
                        position: Position::from_offset(self.input, pos),
                    })
                }
            }
        }
    }

    // Split character data on entity references; queue everything after
    // the first run.
    fn pump_text(&mut self, text: &'input str, pos: usize) -> Result<Raw<'input>, Error> {
        let mut runs = entity::split_runs(text)?.into_iter();
        let mut offset = pos;
        let first = runs.next().expect("split_runs returns at least one run");
        let first = self.run_to_raw(first, &mut offset);
        for run in runs {
            let raw = self.run_to_raw(run, &mut offset);
            self.queue.push_back(raw);
        }
        Ok(first)
    }

    fn run_to_raw(&self, run: TextRun<'input>, offset: &mut usize) -> Raw<'input> {
        let pos = *offset;
        match run {
            TextRun::Text(text) => {
                *offset += text.len();
                Raw::Text { text, pos }
            }
            TextRun::EntityRef(name) => {
                *offset += name.len() + 2;
                Raw::EntityRef { name, pos }
            }
        }
    }

    // Consume the internal DTD subset, registering declared entities.
    // Returns the end offset of the closing `]>`.
    fn capture_dtd(&mut self, start: usize) -> Result<usize, Error> {
        loop {
            let token = match self.tokenizer.next() {
                Some(token) => token?,
                None => {
                    return Err(Error::StructuralMismatch {
                        expected: "`]>`".to_string(),
                        actual: "end of document".to_string(),
                        position: Position::from_offset(self.input, start),
                    })
                }
            };
            match token {
                Token::EntityDeclaration {
                    name, definition, ..
                } => {
                    if let xmlparser::EntityDefinition::EntityValue(value) = definition {
                        trace!("registering entity `{}` from internal subset", name.as_str());
                        self.replacements
                            .insert(name.as_str().to_string(), value.as_str().to_string());
                    }
                }
                Token::DtdEnd { span } => return Ok(span.end()),
                _ => {}
            }
        }
    }

    // ---- commit: apply one raw unit to the observable reader state ----

    fn commit(&mut self, raw: Raw<'input>) -> Result<EventKind, Error> {
        // the scope of an element survives until its end tag has been
        // consumed; drop it now that we are moving past
        if self.end_pending {
            self.frames.pop();
            if self.options.namespace_aware {
                self.scope.pop_scope();
            }
            self.end_pending = false;
        }
        self.attrs.clear();
        self.text = None;
        self.entity_name = None;
        self.is_empty = false;

        let kind = match raw {
            Raw::StartTag {
                prefix,
                local,
                qname,
                attrs,
                empty,
                pos,
            } => {
                self.event_pos = pos;
                self.commit_start_tag(prefix, local, qname, attrs, empty)?;
                EventKind::StartTag
            }
            Raw::EndTag {
                prefix,
                local,
                qname,
                pos,
            } => {
                self.event_pos = pos;
                self.commit_end_tag(prefix, local, qname, pos)?;
                EventKind::EndTag
            }
            Raw::EndEmptyTag => {
                if let Some(frame) = self.frames.last() {
                    self.event_pos = frame.pos;
                }
                self.end_pending = true;
                EventKind::EndTag
            }
            Raw::Text { text, pos } => {
                self.event_pos = pos;
                self.text = Some(Cow::Borrowed(text));
                EventKind::Text
            }
            Raw::Coalesced { text, pos } => {
                self.event_pos = pos;
                self.text = Some(text);
                EventKind::Text
            }
            Raw::CData { text, pos } => {
                self.event_pos = pos;
                self.text = Some(Cow::Borrowed(text));
                EventKind::CData
            }
            Raw::EntityRef { name, pos } => {
                self.event_pos = pos;
                self.entity_name = Some(name);
                self.text = entity::replacement(name, &self.replacements)?
                    .map(|r| Cow::Owned(r.into_owned()));
                EventKind::EntityRef
            }
            Raw::Comment { text, pos } => {
                self.event_pos = pos;
                self.text = Some(Cow::Borrowed(text));
                EventKind::Comment
            }
            Raw::Pi { text, pos } => {
                self.event_pos = pos;
                self.text = Some(Cow::Borrowed(text));
                EventKind::ProcessingInstruction
            }
            Raw::DocDecl { text, pos } => {
                self.event_pos = pos;
                self.text = Some(Cow::Borrowed(text));
                EventKind::DocDecl
            }
            Raw::Whitespace { text, pos } => {
                self.event_pos = pos;
                self.text = Some(Cow::Borrowed(text));
                EventKind::IgnorableWhitespace
            }
            Raw::EndDocument => {
                if let Some(frame) = self.frames.last() {
                    return Err(Error::StructuralMismatch {
                        expected: format!("</{}>", display_qname(frame.prefix, frame.local)),
                        actual: "end of document".to_string(),
                        position: Position::from_offset(self.input, self.input.len()),
                    });
                }
                self.event_pos = self.input.len();
                EventKind::EndDocument
            }
        };
        self.kind = kind;
        trace!("event {} at depth {}", kind, self.depth());
        Ok(kind)
    }

    fn commit_start_tag(
        &mut self,
        prefix: Option<&'input str>,
        local: &'input str,
        qname: &'input str,
        attrs: Vec<RawAttr<'input>>,
        empty: bool,
    ) -> Result<(), Error> {
        if !self.options.namespace_aware {
            for attr in &attrs {
                self.check_duplicate_qname(attr.qname, attr.pos)?;
                self.attrs.push(Attribute {
                    prefix: None,
                    namespace: None,
                    local_name: attr.qname,
                    value: entity::resolve_references(
                        Cow::Borrowed(attr.value),
                        &self.replacements,
                    )?,
                });
            }
            self.frames.push(Frame {
                prefix: None,
                local: qname,
                namespace: None,
                pos: self.event_pos,
            });
            self.is_empty = empty;
            return Ok(());
        }

        if prefix == Some("xmlns") {
            return Err(Error::InvalidDeclaration {
                reason: "element names may not use the `xmlns` prefix".to_string(),
                position: Position::from_offset(self.input, self.event_pos),
            });
        }

        self.scope.push_scope();

        // first pass: namespace declarations feed the scope
        for attr in &attrs {
            let declared = match (attr.prefix, attr.local) {
                (Some("xmlns"), declared) => Some(Some(declared)),
                (None, "xmlns") => Some(None),
                _ => None,
            };
            if let Some(declared) = declared {
                let uri =
                    entity::resolve_references(Cow::Borrowed(attr.value), &self.replacements)?;
                self.check_declaration(declared, &uri, attr.pos)?;
                self.scope
                    .declare(declared.map(Cow::Borrowed), uri);
            }
        }

        let namespace = match prefix {
            Some(p) => self
                .scope
                .resolve_cow(Some(p))
                .ok_or_else(|| Error::UnboundPrefix {
                    prefix: p.to_string(),
                    position: Position::from_offset(self.input, self.event_pos),
                })?,
            None => self
                .scope
                .resolve_cow(None)
                .unwrap_or(Cow::Borrowed("")),
        };

        // second pass: the attribute list, in document order
        for attr in &attrs {
            let is_declaration =
                attr.prefix == Some("xmlns") || (attr.prefix.is_none() && attr.local == "xmlns");
            if is_declaration && !self.options.report_namespace_attributes {
                continue;
            }
            let namespace = if is_declaration {
                Some(Cow::Borrowed(XMLNS_NAMESPACE))
            } else if let Some(p) = attr.prefix {
                Some(
                    self.scope
                        .resolve_cow(Some(p))
                        .ok_or_else(|| Error::UnboundPrefix {
                            prefix: p.to_string(),
                            position: Position::from_offset(self.input, attr.pos),
                        })?,
                )
            } else {
                None
            };
            let entry = Attribute {
                prefix: attr.prefix,
                namespace,
                local_name: attr.local,
                value: entity::resolve_references(Cow::Borrowed(attr.value), &self.replacements)?,
            };
            if self
                .attrs
                .iter()
                .any(|a| a.local_name == entry.local_name && a.namespace == entry.namespace)
            {
                return Err(Error::DuplicatedAttribute {
                    name: attr.qname.to_string(),
                    position: Position::from_offset(self.input, attr.pos),
                });
            }
            self.attrs.push(entry);
        }

        self.frames.push(Frame {
            prefix,
            local,
            namespace: Some(namespace),
            pos: self.event_pos,
        });
        self.is_empty = empty;
        Ok(())
    }

    fn check_declaration(
        &self,
        prefix: Option<&str>,
        uri: &str,
        pos: usize,
    ) -> Result<(), Error> {
        let position = Position::from_offset(self.input, pos);
        let reason = if prefix == Some("xmlns") {
            "the `xmlns` prefix cannot be declared"
        } else if prefix == Some("xml") && uri != XML_NAMESPACE {
            "the `xml` prefix is reserved for the XML namespace"
        } else if prefix != Some("xml") && uri == XML_NAMESPACE {
            "the XML namespace can only be bound to the `xml` prefix"
        } else if uri == XMLNS_NAMESPACE {
            "the xmlns namespace cannot be declared"
        } else if self.scope.declared_in_current_scope(prefix) {
            "prefix declared twice on one element"
        } else {
            return Ok(());
        };
        Err(Error::InvalidDeclaration {
            reason: reason.to_string(),
            position,
        })
    }

    fn check_duplicate_qname(&self, qname: &str, pos: usize) -> Result<(), Error> {
        if self.attrs.iter().any(|a| a.local_name == qname) {
            return Err(Error::DuplicatedAttribute {
                name: qname.to_string(),
                position: Position::from_offset(self.input, pos),
            });
        }
        Ok(())
    }

    fn commit_end_tag(
        &mut self,
        prefix: Option<&'input str>,
        local: &'input str,
        qname: &'input str,
        pos: usize,
    ) -> Result<(), Error> {
        let frame = self.frames.last().ok_or_else(|| Error::StructuralMismatch {
            expected: "end of document".to_string(),
            actual: format!("</{}>", qname),
            position: Position::from_offset(self.input, pos),
        })?;
        let matches = if self.options.namespace_aware {
            frame.prefix == prefix && frame.local == local
        } else {
            frame.local == qname
        };
        if !matches {
            return Err(Error::StructuralMismatch {
                expected: format!("</{}>", display_qname(frame.prefix, frame.local)),
                actual: format!("</{}>", qname),
                position: Position::from_offset(self.input, pos),
            });
        }
        self.end_pending = true;
        Ok(())
    }
}

fn append_run<'input>(
    pending: &mut Option<(Cow<'input, str>, usize)>,
    run: Cow<'input, str>,
    pos: usize,
) {
    match pending {
        None => *pending = Some((run, pos)),
        Some((text, _)) => text.to_mut().push_str(&run),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// The qualified name as written, sliced from the input.
fn qname_slice<'input>(
    input: &'input str,
    prefix: xmlparser::StrSpan<'input>,
    local: xmlparser::StrSpan<'input>,
) -> &'input str {
    if prefix.as_str().is_empty() {
        local.as_str()
    } else {
        &input[prefix.start()..local.end()]
    }
}

fn display_qname(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

fn describe(kind: EventKind, namespace: Option<&str>, name: Option<&str>) -> String {
    let mut out = kind.to_string();
    if let Some(ns) = namespace {
        out.push_str(&format!(" {{{}}}", ns));
        if let Some(name) = name {
            out.push_str(name);
        }
    } else if let Some(name) = name {
        out.push_str(&format!(" {}", name));
    }
    out
}
