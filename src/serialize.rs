use std::io::Write;

use indextree::NodeEdge;

use crate::document::{Node, Tree};
use crate::error::Error;
use crate::writer::Writer;
use crate::xmlvalue::Value;

impl Tree {
    /// Serialize a subtree as an XML string.
    pub fn to_string(&self, node: Node) -> Result<String, Error> {
        let mut buf = Vec::new();
        self.serialize_node(node, &mut buf)?;
        Ok(String::from_utf8(buf).expect("serialized XML is valid UTF-8"))
    }

    /// Serialize a subtree, driving an event sink over `w`.
    ///
    /// Namespace declarations are re-emitted exactly where the tree carries
    /// them; names in scope resolve to the prefixes those declarations
    /// bound, and the sink allocates fresh prefixes for anything left
    /// unbound.
    pub fn serialize_node<W: Write>(&self, node: Node, w: &mut W) -> Result<(), Error> {
        let mut writer = Writer::new(w);
        writer.start_document(None, None)?;
        for edge in node.get().traverse(&self.arena) {
            match edge {
                NodeEdge::Start(current) => {
                    self.write_edge_start(Node::new(current), &mut writer)?
                }
                NodeEdge::End(current) => self.write_edge_end(Node::new(current), &mut writer)?,
            }
        }
        writer.end_document()?;
        Ok(())
    }

    fn write_edge_start<W: Write>(&self, node: Node, writer: &mut Writer<W>) -> Result<(), Error> {
        match self.value(node) {
            Value::Element(element) => {
                for (prefix_id, namespace_id) in element.prefixes().iter() {
                    let prefix = self.prefix_str(*prefix_id);
                    let prefix = if prefix.is_empty() { None } else { Some(prefix) };
                    writer.set_prefix(prefix, self.namespace_str(*namespace_id))?;
                }
                let (local, namespace_id) = self.name_parts(element.name());
                writer.start_tag(self.namespace_str(namespace_id), local)?;
                for (name_id, value) in element.attributes().iter() {
                    let (local, namespace_id) = self.name_parts(*name_id);
                    writer.attribute(self.namespace_str(namespace_id), local, value)?;
                }
            }
            Value::Text(text) => {
                writer.text(text.get())?;
            }
        }
        Ok(())
    }

    fn write_edge_end<W: Write>(&self, node: Node, writer: &mut Writer<W>) -> Result<(), Error> {
        if let Value::Element(element) = self.value(node) {
            let (local, namespace_id) = self.name_parts(element.name());
            writer.end_tag(self.namespace_str(namespace_id), local)?;
        }
        Ok(())
    }
}
