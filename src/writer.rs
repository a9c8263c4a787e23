use std::borrow::Cow;
use std::io::Write;

use log::trace;

use crate::entity::{serialize_attribute, serialize_text};
use crate::error::Error;
use crate::scope::ScopeStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeDocument,
    InDocument,
    // set_prefix was called; only set_prefix or start_tag may follow
    AfterBind,
    Finished,
}

// An element whose end tag is still outstanding.
struct OpenTag {
    namespace: String,
    local: String,
    // the qualified name as written, reused verbatim for the end tag
    qname: String,
}

/// A push-based XML event sink writing text to an [`io::Write`].
///
/// The writer keeps its own namespace scope: prefixes bound with
/// [`Writer::set_prefix`] apply to the next element and its descendants,
/// and names in namespaces with no visible binding get a freshly generated
/// prefix (`n0`, `n1`, …) declared on the spot. Every binding goes out of
/// scope when the element that introduced it is closed.
pub struct Writer<W: Write> {
    w: W,
    state: State,
    scope: ScopeStack<'static>,
    // bindings from set_prefix waiting for the next start_tag
    pending: Vec<(Option<String>, String)>,
    open: Vec<OpenTag>,
    // the innermost start tag has not been closed with `>` yet
    tag_open: bool,
    generated: u32,
}

impl<W: Write> Writer<W> {
    /// Create a writer over an output stream.
    pub fn new(w: W) -> Self {
        Writer {
            w,
            state: State::BeforeDocument,
            scope: ScopeStack::new(),
            pending: Vec::new(),
            open: Vec::new(),
            tag_open: false,
            generated: 0,
        }
    }

    /// Start the document. An XML declaration is written only when
    /// encoding or standalone metadata is given, so documents without one
    /// reproduce without one.
    pub fn start_document(
        &mut self,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> Result<(), Error> {
        if self.state != State::BeforeDocument {
            return Err(Error::SinkUsage(
                "start_document after the document was started".to_string(),
            ));
        }
        if encoding.is_some() || standalone.is_some() {
            write!(self.w, "<?xml version=\"1.0\"")?;
            if let Some(encoding) = encoding {
                write!(self.w, " encoding=\"{}\"", encoding)?;
            }
            if let Some(standalone) = standalone {
                write!(
                    self.w,
                    " standalone=\"{}\"",
                    if standalone { "yes" } else { "no" }
                )?;
            }
            write!(self.w, "?>")?;
        }
        self.state = State::InDocument;
        Ok(())
    }

    /// End the document and flush the stream. All elements must have been
    /// closed.
    pub fn end_document(&mut self) -> Result<(), Error> {
        self.check_in_document("end_document")?;
        if let Some(open) = self.open.last() {
            return Err(Error::SinkUsage(format!(
                "end_document with <{}> still open",
                open.qname
            )));
        }
        self.state = State::Finished;
        self.w.flush()?;
        Ok(())
    }

    /// Bind a prefix for the next element and its descendants. Must be
    /// followed only by further `set_prefix` calls or `start_tag`. The
    /// binding is always declared on that element, even when unused.
    pub fn set_prefix(&mut self, prefix: Option<&str>, uri: &str) -> Result<(), Error> {
        if self.state == State::BeforeDocument || self.state == State::Finished {
            return Err(Error::SinkUsage("set_prefix outside a document".to_string()));
        }
        if let Some(p) = prefix {
            if p == "xml" || p == "xmlns" {
                return Err(Error::SinkUsage(format!(
                    "the `{}` prefix is reserved and cannot be bound",
                    p
                )));
            }
        }
        // a later binding for the same prefix replaces the earlier one
        self.pending.retain(|(p, _)| p.as_deref() != prefix);
        self.pending
            .push((prefix.map(|p| p.to_string()), uri.to_string()));
        self.state = State::AfterBind;
        Ok(())
    }

    /// Write a start tag for `(namespace, local)`. The empty namespace
    /// writes an unqualified name; anything else resolves to a visible
    /// prefix or gets a generated one.
    pub fn start_tag(&mut self, namespace: &str, local: &str) -> Result<(), Error> {
        if self.state == State::BeforeDocument || self.state == State::Finished {
            return Err(Error::SinkUsage("start_tag outside a document".to_string()));
        }
        self.close_open_tag()?;

        self.scope.push_scope();
        let pending = std::mem::take(&mut self.pending);
        for (prefix, uri) in &pending {
            self.scope
                .declare(prefix.clone().map(Cow::Owned), Cow::Owned(uri.clone()));
        }
        // declarations introduced by this tag, written right after the name
        let mut declarations: Vec<(Option<String>, String)> = pending;

        let qname = if namespace.is_empty() {
            if !self.scope.resolve_default().is_empty() {
                // un-bind the inherited default namespace for this scope
                self.scope.declare(None, Cow::Borrowed(""));
                declarations.push((None, String::new()));
            }
            local.to_string()
        } else {
            match self.scope.prefix_for_element(namespace) {
                Some(None) => local.to_string(),
                Some(Some(prefix)) => format!("{}:{}", prefix, local),
                None => {
                    let prefix = self.generate_prefix();
                    self.scope.declare(
                        Some(Cow::Owned(prefix.clone())),
                        Cow::Owned(namespace.to_string()),
                    );
                    declarations.push((Some(prefix.clone()), namespace.to_string()));
                    format!("{}:{}", prefix, local)
                }
            }
        };

        trace!("start tag <{}>", qname);
        write!(self.w, "<{}", qname)?;
        for (prefix, uri) in &declarations {
            self.write_declaration(prefix.as_deref(), uri)?;
        }

        self.open.push(OpenTag {
            namespace: namespace.to_string(),
            local: local.to_string(),
            qname,
        });
        self.tag_open = true;
        self.state = State::InDocument;
        Ok(())
    }

    /// Write an attribute. Must immediately follow `start_tag` or another
    /// `attribute` call.
    pub fn attribute(&mut self, namespace: &str, local: &str, value: &str) -> Result<(), Error> {
        if self.state == State::AfterBind {
            return Err(Error::SinkUsage(
                "set_prefix must be followed by start_tag".to_string(),
            ));
        }
        if !self.tag_open {
            return Err(Error::SinkUsage(
                "attribute outside an open start tag".to_string(),
            ));
        }
        let qname = if namespace.is_empty() {
            local.to_string()
        } else {
            match self.scope.prefix_for_attribute(namespace) {
                Some(prefix) => format!("{}:{}", prefix, local),
                None => {
                    // attributes cannot ride the default namespace; a
                    // fresh prefix is declared on the open tag
                    let prefix = self.generate_prefix();
                    self.scope.declare(
                        Some(Cow::Owned(prefix.clone())),
                        Cow::Owned(namespace.to_string()),
                    );
                    self.write_declaration(Some(&prefix), namespace)?;
                    format!("{}:{}", prefix, local)
                }
            }
        };
        write!(
            self.w,
            " {}=\"{}\"",
            qname,
            serialize_attribute(value.into())
        )?;
        Ok(())
    }

    /// Write an end tag. `(namespace, local)` must match the innermost
    /// open element; the repetition exists to catch mismatched calls
    /// early.
    pub fn end_tag(&mut self, namespace: &str, local: &str) -> Result<(), Error> {
        self.check_in_document("end_tag")?;
        let open = match self.open.last() {
            Some(open) => open,
            None => {
                return Err(Error::SinkUsage(format!(
                    "end_tag </{}> with no open element",
                    local
                )))
            }
        };
        if open.namespace != namespace || open.local != local {
            return Err(Error::SinkUsage(format!(
                "end_tag </{{{}}}{}> does not match open element <{}>",
                namespace, local, open.qname
            )));
        }
        if self.tag_open {
            write!(self.w, "/>")?;
            self.tag_open = false;
        } else {
            write!(self.w, "</{}>", open.qname)?;
        }
        self.open.pop();
        self.scope.pop_scope();
        Ok(())
    }

    /// Write character data, escaping special characters.
    pub fn text(&mut self, text: &str) -> Result<(), Error> {
        self.check_in_document("text")?;
        self.close_open_tag()?;
        write!(self.w, "{}", serialize_text(text.into()))?;
        Ok(())
    }

    /// Write a comment. The text may not contain `--`.
    pub fn comment(&mut self, text: &str) -> Result<(), Error> {
        self.check_in_document("comment")?;
        if text.contains("--") {
            return Err(Error::InvalidComment(text.to_string()));
        }
        self.close_open_tag()?;
        write!(self.w, "<!--{}-->", text)?;
        Ok(())
    }

    /// Write a processing instruction from its combined
    /// `target [content]` text. The text may not contain `?>`.
    pub fn processing_instruction(&mut self, text: &str) -> Result<(), Error> {
        self.check_in_document("processing_instruction")?;
        if text.contains("?>") {
            return Err(Error::InvalidTarget(text.to_string()));
        }
        self.close_open_tag()?;
        write!(self.w, "<?{}?>", text)?;
        Ok(())
    }

    /// Write a CDATA section. The text may not contain `]]>`.
    pub fn cdata(&mut self, text: &str) -> Result<(), Error> {
        self.check_in_document("cdata")?;
        if text.contains("]]>") {
            return Err(Error::InvalidCData(text.to_string()));
        }
        self.close_open_tag()?;
        write!(self.w, "<![CDATA[{}]]>", text)?;
        Ok(())
    }

    /// Write an entity reference by name, e.g. `amp` for `&amp;`.
    pub fn entity_ref(&mut self, name: &str) -> Result<(), Error> {
        self.check_in_document("entity_ref")?;
        self.close_open_tag()?;
        write!(self.w, "&{};", name)?;
        Ok(())
    }

    /// Write a document type declaration from everything between
    /// `<!DOCTYPE` and `>`.
    pub fn doc_decl(&mut self, text: &str) -> Result<(), Error> {
        self.check_in_document("doc_decl")?;
        self.close_open_tag()?;
        write!(self.w, "<!DOCTYPE{}>", text)?;
        Ok(())
    }

    /// Write whitespace outside the root element, verbatim.
    pub fn ignorable_whitespace(&mut self, text: &str) -> Result<(), Error> {
        self.check_in_document("ignorable_whitespace")?;
        self.close_open_tag()?;
        write!(self.w, "{}", text)?;
        Ok(())
    }

    /// Write pending output: closes an open start tag and flushes the
    /// underlying stream.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.close_open_tag()?;
        self.w.flush()?;
        Ok(())
    }

    fn check_in_document(&self, operation: &str) -> Result<(), Error> {
        match self.state {
            State::InDocument => Ok(()),
            State::AfterBind => Err(Error::SinkUsage(
                "set_prefix must be followed by start_tag".to_string(),
            )),
            State::BeforeDocument | State::Finished => Err(Error::SinkUsage(format!(
                "{} outside a document",
                operation
            ))),
        }
    }

    fn close_open_tag(&mut self) -> Result<(), Error> {
        if self.tag_open {
            write!(self.w, ">")?;
            self.tag_open = false;
        }
        Ok(())
    }

    fn write_declaration(&mut self, prefix: Option<&str>, uri: &str) -> Result<(), Error> {
        match prefix {
            Some(prefix) => write!(
                self.w,
                " xmlns:{}=\"{}\"",
                prefix,
                serialize_attribute(uri.into())
            )?,
            None => write!(self.w, " xmlns=\"{}\"", serialize_attribute(uri.into()))?,
        }
        Ok(())
    }

    fn generate_prefix(&mut self) -> String {
        loop {
            let prefix = format!("n{}", self.generated);
            self.generated += 1;
            if !self.scope.is_prefix_taken(&prefix) {
                return prefix;
            }
        }
    }
}
