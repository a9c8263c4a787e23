use crate::document::{Node, Tree};
use crate::error::Error;
use crate::event::EventKind;
use crate::reader::Reader;
use crate::xmlvalue::{Element, Value};

impl Tree {
    /// Build the root element subtree from a reader by recursive descent.
    ///
    /// The reader may be freshly constructed (still on StartDocument) or
    /// already advanced to the root start tag. Returns the root node once
    /// its end tag has been consumed; trailing content after the root is
    /// left unread and is visible only in token mode.
    pub fn build(&mut self, reader: &mut Reader) -> Result<Node, Error> {
        if reader.event_kind() == EventKind::StartDocument {
            reader.next()?;
        }
        reader.require(EventKind::StartTag, None, None)?;
        self.build_element(reader)
    }

    // Reader is positioned on a start tag; consumes through the matching
    // end tag.
    fn build_element(&mut self, reader: &mut Reader) -> Result<Node, Error> {
        let local = expect_name(reader)?.to_string();
        let namespace = reader.namespace().map(|ns| ns.to_string());

        let namespace_id = match &namespace {
            Some(uri) => self.add_namespace(uri),
            None => self.no_namespace_id,
        };
        let name_id = self.add_name_ns(&local, namespace_id);
        let mut element = Element::new(name_id);

        // reconstruct exactly the bindings this start tag introduced
        let depth = reader.depth();
        let base = reader.namespace_count(depth - 1)?;
        let count = reader.namespace_count(depth)?;
        for pos in base..count {
            let binding = reader.namespace_binding(pos)?;
            let prefix_id = match binding.prefix.as_deref() {
                Some(prefix) => self.add_prefix(prefix),
                None => self.empty_prefix_id,
            };
            let uri_id = self.add_namespace(&binding.uri);
            element.set_prefix(prefix_id, uri_id);
        }

        for index in 0..reader.attribute_count()? {
            let (attr_name, attr_value) = {
                let attr = reader.attribute(index)?;
                let attr_namespace_id = match attr.namespace.as_deref() {
                    Some(uri) if !uri.is_empty() => self.add_namespace(uri),
                    _ => self.no_namespace_id,
                };
                (
                    self.add_name_ns(attr.local_name, attr_namespace_id),
                    attr.value.to_string(),
                )
            };
            element.set_attribute(attr_name, attr_value);
        }

        let node = Node::new(self.arena.new_node(Value::Element(element)));

        loop {
            match reader.next()? {
                EventKind::StartTag => {
                    let child = self.build_element(reader)?;
                    self.append(node, child);
                }
                EventKind::Text => {
                    let text = reader.text().unwrap_or("");
                    let child = self.new_text(text);
                    self.append(node, child);
                }
                EventKind::EndTag => break,
                kind => {
                    return Err(Error::StructuralMismatch {
                        expected: "start tag, text or end tag".to_string(),
                        actual: kind.to_string(),
                        position: reader.position(),
                    })
                }
            }
        }

        reader.require(EventKind::EndTag, namespace.as_deref(), Some(&local))?;
        Ok(node)
    }
}

fn expect_name<'a>(reader: &'a Reader) -> Result<&'a str, Error> {
    reader.local_name().ok_or(Error::InvalidEventState {
        operation: "local_name",
        kind: reader.event_kind(),
    })
}
