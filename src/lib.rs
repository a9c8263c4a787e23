#![forbid(unsafe_code)]

//! Streaming namespace-aware XML pull parsing.
//!
//! A [`Reader`] turns a document into a stream of events, pulled one at a
//! time in either of two granularities: [`Reader::next`] coalesces content
//! into a minimal five-kind model, [`Reader::next_token`] surfaces every
//! lexical unit (comments, processing instructions, CDATA sections, entity
//! references). On top of the stream sit two consumers: [`Tree::build`]
//! reconstructs an element tree, and [`Bridge`] replays the stream into a
//! [`Writer`] sink to reconstruct an equivalent document.
//!
//! ```rust
//! use xpull::{Reader, Tree};
//!
//! let mut reader = Reader::new("<doc><p>hello</p></doc>");
//! let mut tree = Tree::new();
//! let root = tree.build(&mut reader)?;
//! assert_eq!(tree.to_string(root)?, "<doc><p>hello</p></doc>");
//! # Ok::<(), xpull::Error>(())
//! ```

mod bridge;
mod build;
mod document;
mod entity;
mod error;
mod event;
mod id;
mod reader;
mod scope;
mod serialize;
mod writer;
mod xmlvalue;

pub use bridge::{Bridge, BridgeOptions};
pub use document::{Node, Tree};
pub use error::{Error, Position};
pub use event::{Attribute, EventKind};
pub use id::{NameId, NamespaceId, PrefixId};
pub use reader::{Reader, ReaderOptions};
pub use scope::{NamespaceBinding, XMLNS_NAMESPACE, XML_NAMESPACE};
pub use writer::Writer;
pub use xmlvalue::{Attributes, Element, Prefixes, Text, Value, ValueType};
