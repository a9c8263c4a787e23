use xpull::{Error, EventKind, Reader, ReaderOptions, XMLNS_NAMESPACE, XML_NAMESPACE};

#[test]
fn test_event_sequence() {
    let mut reader = Reader::new("<doc>hello</doc>");
    assert_eq!(reader.event_kind(), EventKind::StartDocument);
    assert_eq!(reader.depth(), 0);

    assert_eq!(reader.next().unwrap(), EventKind::StartTag);
    assert_eq!(reader.local_name(), Some("doc"));
    assert_eq!(reader.namespace(), Some(""));
    assert_eq!(reader.prefix(), None);
    assert_eq!(reader.depth(), 1);

    assert_eq!(reader.next().unwrap(), EventKind::Text);
    assert_eq!(reader.text(), Some("hello"));
    assert_eq!(reader.depth(), 1);

    assert_eq!(reader.next().unwrap(), EventKind::EndTag);
    assert_eq!(reader.local_name(), Some("doc"));
    assert_eq!(reader.depth(), 1);

    assert_eq!(reader.next().unwrap(), EventKind::EndDocument);
    assert_eq!(reader.depth(), 0);
    assert!(matches!(reader.next(), Err(Error::PastEndOfDocument)));
}

#[test]
fn test_event_mode_coalesces_content() {
    let mut reader = Reader::new("<a>x<!--c-->y<![CDATA[z]]>&amp;w</a>");
    reader.next().unwrap();
    assert_eq!(reader.next().unwrap(), EventKind::Text);
    assert_eq!(reader.text(), Some("xyz&w"));
    assert_eq!(reader.next().unwrap(), EventKind::EndTag);
}

#[test]
fn test_coalescing_at_most_one_text_between_siblings() {
    let mut reader = Reader::new("<a>1<!--x-->2<b/>3&#52;</a>");
    assert_eq!(reader.next().unwrap(), EventKind::StartTag);
    assert_eq!(reader.next().unwrap(), EventKind::Text);
    assert_eq!(reader.text(), Some("12"));
    assert_eq!(reader.next().unwrap(), EventKind::StartTag);
    assert_eq!(reader.next().unwrap(), EventKind::EndTag);
    assert_eq!(reader.next().unwrap(), EventKind::Text);
    assert_eq!(reader.text(), Some("34"));
    assert_eq!(reader.next().unwrap(), EventKind::EndTag);
}

#[test]
fn test_whitespace_run_is_text_in_event_mode() {
    let mut reader = Reader::new("<a>  <b/></a>");
    reader.next().unwrap();
    assert_eq!(reader.next().unwrap(), EventKind::Text);
    assert_eq!(reader.text(), Some("  "));
    assert!(reader.is_whitespace().unwrap());
}

#[test]
fn test_token_sequence() {
    let mut reader = Reader::new("<foo><!--c--><?pi d?><![CDATA[x]]></foo>");
    assert_eq!(reader.next_token().unwrap(), EventKind::StartTag);
    assert_eq!(reader.next_token().unwrap(), EventKind::Comment);
    assert_eq!(reader.text(), Some("c"));
    assert_eq!(reader.next_token().unwrap(), EventKind::ProcessingInstruction);
    assert_eq!(reader.text(), Some("pi d"));
    assert_eq!(reader.next_token().unwrap(), EventKind::CData);
    assert_eq!(reader.text(), Some("x"));
    assert_eq!(reader.next_token().unwrap(), EventKind::EndTag);
    assert_eq!(reader.next_token().unwrap(), EventKind::EndDocument);
}

#[test]
fn test_token_mode_entity_refs() {
    let mut reader = Reader::new("<a>x&amp;&foo;</a>");
    reader.define_entity_replacement("foo", "FOO");
    reader.next_token().unwrap();
    assert_eq!(reader.next_token().unwrap(), EventKind::Text);
    assert_eq!(reader.text(), Some("x"));
    assert_eq!(reader.next_token().unwrap(), EventKind::EntityRef);
    assert_eq!(reader.local_name(), Some("amp"));
    assert_eq!(reader.text(), Some("&"));
    assert_eq!(reader.next_token().unwrap(), EventKind::EntityRef);
    assert_eq!(reader.local_name(), Some("foo"));
    assert_eq!(reader.text(), Some("FOO"));
    assert_eq!(reader.next_token().unwrap(), EventKind::EndTag);
}

#[test]
fn test_token_mode_unknown_entity_carries_name_only() {
    let mut reader = Reader::new("<a>&mystery;</a>");
    reader.next_token().unwrap();
    assert_eq!(reader.next_token().unwrap(), EventKind::EntityRef);
    assert_eq!(reader.local_name(), Some("mystery"));
    assert_eq!(reader.text(), None);
}

#[test]
fn test_event_mode_unknown_entity_is_fatal() {
    let mut reader = Reader::new("<a>&mystery;</a>");
    reader.next().unwrap();
    assert!(matches!(reader.next(), Err(Error::UnresolvedEntity(_))));
}

#[test]
fn test_empty_element_pairing() {
    let mut reader = Reader::new("<a><b/><c></c></a>");
    reader.next().unwrap();

    assert_eq!(reader.next().unwrap(), EventKind::StartTag);
    assert_eq!(reader.local_name(), Some("b"));
    assert!(reader.is_empty_element().unwrap());
    assert_eq!(reader.next().unwrap(), EventKind::EndTag);
    assert_eq!(reader.local_name(), Some("b"));

    assert_eq!(reader.next().unwrap(), EventKind::StartTag);
    assert_eq!(reader.local_name(), Some("c"));
    assert!(!reader.is_empty_element().unwrap());
    assert_eq!(reader.next().unwrap(), EventKind::EndTag);

    assert_eq!(reader.next().unwrap(), EventKind::EndTag);
    assert!(matches!(
        reader.is_empty_element(),
        Err(Error::InvalidEventState { .. })
    ));
}

#[test]
fn test_require_skips_whitespace_text() {
    let mut reader = Reader::new("<a>  <b/></a>");
    reader.next().unwrap();
    reader.next().unwrap(); // the whitespace run
    reader
        .require(EventKind::StartTag, Some(""), Some("b"))
        .unwrap();
}

#[test]
fn test_require_mismatch() {
    let mut reader = Reader::new("<a/>");
    reader.next().unwrap();
    let err = reader
        .require(EventKind::StartTag, Some("urn:x"), Some("a"))
        .unwrap_err();
    match err {
        Error::StructuralMismatch {
            expected, actual, ..
        } => {
            assert!(expected.contains("urn:x"));
            assert!(actual.contains("start tag"));
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_prefix_shadowing_and_restoration() {
    let mut reader = Reader::new("<a xmlns:p='u1'><b xmlns:p='u2'/><c/></a>");
    reader.next().unwrap();
    assert_eq!(reader.resolve(Some("p")), Some("u1"));

    reader.next().unwrap(); // <b>
    assert_eq!(reader.resolve(Some("p")), Some("u2"));
    reader.next().unwrap(); // </b>: the binding lives through the end tag
    assert_eq!(reader.resolve(Some("p")), Some("u2"));

    reader.next().unwrap(); // <c>: sibling, after b closed
    assert_eq!(reader.local_name(), Some("c"));
    assert_eq!(reader.resolve(Some("p")), Some("u1"));
}

#[test]
fn test_multi_level_overlapping_prefixes() {
    let mut reader = Reader::new(
        "<foo xmlns:ns1='n1'><bar xmlns:ns1='x1' xmlns:ns3='n3'><x/></bar><y/></foo>",
    );
    reader.next().unwrap(); // foo
    assert_eq!(reader.resolve(Some("ns1")), Some("n1"));
    assert_eq!(reader.resolve(Some("ns3")), None);

    reader.next().unwrap(); // bar
    assert_eq!(reader.resolve(Some("ns1")), Some("x1"));
    assert_eq!(reader.resolve(Some("ns3")), Some("n3"));

    reader.next().unwrap(); // x, inside bar's subtree
    assert_eq!(reader.resolve(Some("ns1")), Some("x1"));
    reader.next().unwrap(); // </x>
    reader.next().unwrap(); // </bar>

    reader.next().unwrap(); // y, back at foo's level
    assert_eq!(reader.local_name(), Some("y"));
    assert_eq!(reader.resolve(Some("ns1")), Some("n1"));
    assert_eq!(reader.resolve(Some("ns3")), None);
}

#[test]
fn test_namespace_count_monotonic_and_reverting() {
    let mut reader = Reader::new("<a xmlns:p='u1' xmlns:q='u2'><b xmlns:r='u3'/><c/></a>");
    reader.next().unwrap(); // a
    assert_eq!(reader.namespace_count(0).unwrap(), 0);
    assert_eq!(reader.namespace_count(1).unwrap(), 2);

    reader.next().unwrap(); // b
    assert_eq!(reader.namespace_count(1).unwrap(), 2);
    assert_eq!(reader.namespace_count(2).unwrap(), 3);
    reader.next().unwrap(); // </b>

    reader.next().unwrap(); // c: b's binding is gone
    assert_eq!(reader.namespace_count(2).unwrap(), 2);
    assert!(matches!(
        reader.namespace_count(3),
        Err(Error::InvalidDepth { .. })
    ));
}

#[test]
fn test_namespace_binding_positions() {
    let mut reader = Reader::new("<a xmlns:p='u1'><b xmlns='u2'/></a>");
    reader.next().unwrap();
    reader.next().unwrap(); // b
    let base = reader.namespace_count(1).unwrap();
    let count = reader.namespace_count(2).unwrap();
    assert_eq!((base, count), (1, 2));

    let outer = reader.namespace_binding(0).unwrap();
    assert_eq!(outer.prefix.as_deref(), Some("p"));
    assert_eq!(outer.uri, "u1");
    assert_eq!(outer.declared_at_depth, 1);

    let inner = reader.namespace_binding(1).unwrap();
    assert_eq!(inner.prefix, None);
    assert_eq!(inner.uri, "u2");
    assert_eq!(inner.declared_at_depth, 2);

    assert!(matches!(
        reader.namespace_binding(2),
        Err(Error::IndexOutOfBounds { .. })
    ));
}

#[test]
fn test_qualified_names_and_attributes() {
    let mut reader = Reader::new("<n:foo xmlns:n='uri1'><bar n:attr='test' xmlns='uri2'>baz</bar></n:foo>");
    reader.next().unwrap();
    assert_eq!(reader.prefix(), Some("n"));
    assert_eq!(reader.namespace(), Some("uri1"));
    assert_eq!(reader.local_name(), Some("foo"));
    assert_eq!(reader.attribute_count().unwrap(), 0);

    reader.next().unwrap(); // bar
    assert_eq!(reader.namespace(), Some("uri2"));
    assert_eq!(reader.prefix(), None);
    assert_eq!(reader.attribute_count().unwrap(), 1);
    let attr = reader.attribute(0).unwrap();
    assert_eq!(attr.prefix, Some("n"));
    assert_eq!(attr.namespace.as_deref(), Some("uri1"));
    assert_eq!(attr.local_name, "attr");
    assert_eq!(attr.value, "test");
    assert!(matches!(
        reader.attribute(1),
        Err(Error::IndexOutOfBounds { .. })
    ));
}

#[test]
fn test_attribute_count_off_start_tag_is_fatal() {
    let mut reader = Reader::new("<a>t</a>");
    reader.next().unwrap();
    reader.next().unwrap(); // text
    assert!(matches!(
        reader.attribute_count(),
        Err(Error::InvalidEventState { .. })
    ));
}

#[test]
fn test_report_namespace_attributes() {
    let options = ReaderOptions {
        report_namespace_attributes: true,
        ..ReaderOptions::default()
    };
    let mut reader = Reader::with_options(
        "<n:foo xmlns:n='uri1'><bar n:attr='test' xmlns='uri2'/></n:foo>",
        options,
    );
    reader.next().unwrap();
    assert_eq!(reader.attribute_count().unwrap(), 1);
    let decl = reader.attribute(0).unwrap();
    assert_eq!(decl.prefix, Some("xmlns"));
    assert_eq!(decl.local_name, "n");
    assert_eq!(decl.namespace.as_deref(), Some(XMLNS_NAMESPACE));
    assert_eq!(decl.value, "uri1");

    reader.next().unwrap(); // bar
    assert_eq!(reader.attribute_count().unwrap(), 2);
    let default_decl = reader.attribute(1).unwrap();
    assert_eq!(default_decl.prefix, None);
    assert_eq!(default_decl.local_name, "xmlns");
    assert_eq!(default_decl.namespace.as_deref(), Some(XMLNS_NAMESPACE));
}

#[test]
fn test_namespace_processing_disabled() {
    let options = ReaderOptions {
        namespace_aware: false,
        ..ReaderOptions::default()
    };
    let mut reader = Reader::with_options("<n:foo xmlns:n='uri1' n:a='1'/>", options);
    reader.next().unwrap();
    assert_eq!(reader.local_name(), Some("n:foo"));
    assert_eq!(reader.namespace(), None);
    assert_eq!(reader.prefix(), None);
    assert_eq!(reader.attribute_count().unwrap(), 2);
    assert_eq!(reader.attribute(0).unwrap().local_name, "xmlns:n");
    assert_eq!(reader.attribute(1).unwrap().local_name, "n:a");
    assert_eq!(reader.namespace_count(1).unwrap(), 0);
}

#[test]
fn test_default_namespace_unbinding() {
    let mut reader = Reader::new("<foo xmlns='u'><bar xmlns=''/></foo>");
    reader.next().unwrap();
    assert_eq!(reader.namespace(), Some("u"));
    reader.next().unwrap();
    assert_eq!(reader.namespace(), Some(""));
}

#[test]
fn test_prolog_and_epilog_tokens() {
    let mut reader = Reader::new("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!--pre--><doc/>\n");
    assert_eq!(reader.next_token().unwrap(), EventKind::IgnorableWhitespace);
    assert_eq!(reader.text(), Some("\n"));
    assert_eq!(reader.xml_version(), Some("1.0"));
    assert_eq!(reader.declared_encoding(), Some("UTF-8"));
    assert_eq!(reader.declared_standalone(), None);
    assert_eq!(reader.next_token().unwrap(), EventKind::Comment);
    assert_eq!(reader.next_token().unwrap(), EventKind::StartTag);
    assert_eq!(reader.next_token().unwrap(), EventKind::EndTag);
    assert_eq!(reader.next_token().unwrap(), EventKind::IgnorableWhitespace);
    assert_eq!(reader.next_token().unwrap(), EventKind::EndDocument);
}

#[test]
fn test_standalone_flag() {
    let mut reader = Reader::new("<?xml version=\"1.0\" standalone=\"yes\"?><a/>");
    reader.next().unwrap();
    assert_eq!(reader.declared_standalone(), Some(true));
}

#[test]
fn test_doctype_token_and_declared_entity() {
    let mut reader = Reader::new("<!DOCTYPE note [<!ENTITY e \"ee\">]><note>&e;</note>");
    assert_eq!(reader.next_token().unwrap(), EventKind::DocDecl);
    assert_eq!(reader.text(), Some(" note [<!ENTITY e \"ee\">]"));
    assert_eq!(reader.next_token().unwrap(), EventKind::StartTag);
    assert_eq!(reader.next_token().unwrap(), EventKind::EntityRef);
    assert_eq!(reader.local_name(), Some("e"));
    assert_eq!(reader.text(), Some("ee"));
}

#[test]
fn test_declared_entity_resolves_in_event_mode() {
    let mut reader = Reader::new("<!DOCTYPE note [<!ENTITY e \"ee\">]><note>x&e;y</note>");
    reader.next().unwrap(); // note; the doctype is skipped silently
    assert_eq!(reader.local_name(), Some("note"));
    assert_eq!(reader.next().unwrap(), EventKind::Text);
    assert_eq!(reader.text(), Some("xeey"));
}

#[test]
fn test_mismatched_close_tag() {
    let mut reader = Reader::new("<a><b></a></b>");
    reader.next().unwrap();
    reader.next().unwrap();
    let err = reader.next().unwrap_err();
    match err {
        Error::StructuralMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, "</b>");
            assert_eq!(actual, "</a>");
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_unclosed_element_at_end_of_input() {
    let mut reader = Reader::new("<a><b>");
    reader.next().unwrap();
    reader.next().unwrap();
    assert!(matches!(
        reader.next(),
        Err(Error::StructuralMismatch { .. })
    ));
}

#[test]
fn test_duplicate_attribute() {
    let mut reader = Reader::new("<a xmlns:p='u' xmlns:q='u' p:x='1' q:x='2'/>");
    assert!(matches!(
        reader.next(),
        Err(Error::DuplicatedAttribute { .. })
    ));
}

#[test]
fn test_reserved_prefix_declarations() {
    let mut reader = Reader::new("<a xmlns:xml='urn:wrong'/>");
    assert!(matches!(
        reader.next(),
        Err(Error::InvalidDeclaration { .. })
    ));

    let mut reader = Reader::new("<a xmlns:xml='http://www.w3.org/XML/1998/namespace'/>");
    assert_eq!(reader.next().unwrap(), EventKind::StartTag);
}

#[test]
fn test_unbound_prefix_is_fatal_on_use() {
    let mut reader = Reader::new("<p:a/>");
    assert!(matches!(reader.next(), Err(Error::UnboundPrefix { .. })));

    let mut reader = Reader::new("<a p:x='1'/>");
    assert!(matches!(reader.next(), Err(Error::UnboundPrefix { .. })));
}

#[test]
fn test_xml_prefix_is_predeclared() {
    let mut reader = Reader::new("<a xml:space='preserve'/>");
    reader.next().unwrap();
    let attr = reader.attribute(0).unwrap();
    assert_eq!(attr.namespace.as_deref(), Some(XML_NAMESPACE));
    assert_eq!(reader.resolve(Some("xml")), Some(XML_NAMESPACE));
    assert_eq!(reader.resolve(Some("xmlns")), None);
}

#[test]
fn test_attribute_value_references() {
    let mut reader = Reader::new("<a x=\"1 &amp; 2 &#65;\"/>");
    reader.next().unwrap();
    assert_eq!(reader.attribute(0).unwrap().value, "1 & 2 A");
}

#[test]
fn test_position_reporting() {
    let mut reader = Reader::new("<a>\n<b/></a>");
    reader.next().unwrap();
    let position = reader.position();
    assert_eq!((position.line, position.column), (1, 1));
    reader.next().unwrap(); // the newline text run
    reader.next().unwrap(); // <b>
    let position = reader.position();
    assert_eq!((position.line, position.column), (2, 1));
}

#[test]
fn test_is_whitespace_invalid_state() {
    let mut reader = Reader::new("<a/>");
    reader.next().unwrap();
    assert!(matches!(
        reader.is_whitespace(),
        Err(Error::InvalidEventState { .. })
    ));
}
