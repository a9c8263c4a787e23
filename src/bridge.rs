use std::io::Write;

use log::debug;

use crate::error::Error;
use crate::event::EventKind;
use crate::reader::Reader;
use crate::scope::XMLNS_NAMESPACE;
use crate::writer::Writer;

/// Configuration for a [`Bridge`].
#[derive(Debug, Clone, Copy)]
pub struct BridgeOptions {
    /// Drive the token stream, forwarding comments, processing
    /// instructions, CDATA sections, entity references, the document type
    /// declaration and ignorable whitespace to their dedicated sink
    /// operations. With this off the bridge drives the coalesced event
    /// stream instead: the result is infoset-equivalent, not token-exact.
    pub token_fidelity: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        BridgeOptions {
            token_fidelity: true,
        }
    }
}

/// Replays a reader's event stream into a writer, reconstructing an
/// equivalent document.
///
/// Every namespace binding that becomes visible at a start tag is bound on
/// the sink for exactly that element and its descendants, so the sink's
/// scope mirrors the source's and prefixes survive the trip.
pub struct Bridge<'a, 'input, W: Write> {
    reader: &'a mut Reader<'input>,
    writer: &'a mut Writer<W>,
    options: BridgeOptions,
}

impl<'a, 'input, W: Write> Bridge<'a, 'input, W> {
    /// Create a bridge with default options (token fidelity on).
    pub fn new(reader: &'a mut Reader<'input>, writer: &'a mut Writer<W>) -> Self {
        Self::with_options(reader, writer, BridgeOptions::default())
    }

    /// Create a bridge with explicit options.
    pub fn with_options(
        reader: &'a mut Reader<'input>,
        writer: &'a mut Writer<W>,
        options: BridgeOptions,
    ) -> Self {
        Bridge {
            reader,
            writer,
            options,
        }
    }

    /// Replay the whole document, from StartDocument through EndDocument.
    pub fn round_trip(&mut self) -> Result<(), Error> {
        self.reader.require(EventKind::StartDocument, None, None)?;
        // the first advance consumes the XML declaration, if any, making
        // the document metadata available for the sink
        let mut kind = self.advance()?;
        self.writer.start_document(
            self.reader.declared_encoding(),
            self.reader.declared_standalone(),
        )?;
        loop {
            match kind {
                EventKind::StartTag => self.write_start_tag()?,
                EventKind::EndTag => {
                    let namespace = self.reader.namespace().unwrap_or("");
                    let local = expect_name(self.reader)?;
                    self.writer.end_tag(namespace, local)?;
                }
                EventKind::Text => self.writer.text(self.reader.text().unwrap_or(""))?,
                EventKind::CData => self.writer.cdata(self.reader.text().unwrap_or(""))?,
                EventKind::EntityRef => {
                    let name = expect_name(self.reader)?;
                    self.writer.entity_ref(name)?;
                }
                EventKind::Comment => self.writer.comment(self.reader.text().unwrap_or(""))?,
                EventKind::ProcessingInstruction => self
                    .writer
                    .processing_instruction(self.reader.text().unwrap_or(""))?,
                EventKind::DocDecl => self.writer.doc_decl(self.reader.text().unwrap_or(""))?,
                EventKind::IgnorableWhitespace => self
                    .writer
                    .ignorable_whitespace(self.reader.text().unwrap_or(""))?,
                EventKind::EndDocument => {
                    debug!("round trip complete");
                    return self.writer.end_document();
                }
                EventKind::StartDocument => {
                    return Err(Error::SinkUsage(
                        "start document reported twice".to_string(),
                    ))
                }
            }
            kind = self.advance()?;
        }
    }

    fn advance(&mut self) -> Result<EventKind, Error> {
        if self.options.token_fidelity {
            self.reader.next_token()
        } else {
            self.reader.next()
        }
    }

    fn write_start_tag(&mut self) -> Result<(), Error> {
        let reports_declarations = self.reader.options().report_namespace_attributes;
        if reports_declarations {
            // the declarations travel in the attribute list; turn them
            // back into explicit bindings
            for attr in self.reader.attributes()? {
                if attr.namespace.as_deref() == Some(XMLNS_NAMESPACE) {
                    let (prefix, uri) = match attr.prefix {
                        Some(_) => (Some(attr.local_name), attr.value.as_ref()),
                        None => (None, attr.value.as_ref()),
                    };
                    self.writer.set_prefix(prefix, uri)?;
                }
            }
        } else {
            // bind everything that became visible at this start tag
            let depth = self.reader.depth();
            let base = self.reader.namespace_count(depth - 1)?;
            let count = self.reader.namespace_count(depth)?;
            for pos in base..count {
                let binding = self.reader.namespace_binding(pos)?;
                self.writer
                    .set_prefix(binding.prefix.as_deref(), &binding.uri)?;
            }
        }

        let namespace = self.reader.namespace().unwrap_or("");
        let local = expect_name(self.reader)?;
        self.writer.start_tag(namespace, local)?;

        for attr in self.reader.attributes()? {
            if attr.namespace.as_deref() == Some(XMLNS_NAMESPACE) {
                continue;
            }
            self.writer
                .attribute(attr.namespace_str(), attr.local_name, &attr.value)?;
        }
        Ok(())
    }
}

fn expect_name<'r>(reader: &'r Reader) -> Result<&'r str, Error> {
    reader.local_name().ok_or(Error::InvalidEventState {
        operation: "local_name",
        kind: reader.event_kind(),
    })
}
