use xpull::{Error, Reader, Tree, ValueType};

#[test]
fn test_build_scenario_with_prefixed_root() {
    // root in uri1, child in the default namespace uri2, attribute in uri1
    let mut reader =
        Reader::new("<n:foo xmlns:n='uri1'><bar n:attr='test' xmlns='uri2'>baz</bar></n:foo>");
    let mut tree = Tree::new();
    let root = tree.build(&mut reader).unwrap();

    let root_element = tree.element(root).unwrap();
    let (local, namespace_id) = tree.name_parts(root_element.name());
    assert_eq!(local, "foo");
    assert_eq!(tree.namespace_str(namespace_id), "uri1");

    let bar = tree.first_child(root).unwrap();
    let bar_element = tree.element(bar).unwrap();
    let (local, namespace_id) = tree.name_parts(bar_element.name());
    assert_eq!(local, "bar");
    assert_eq!(tree.namespace_str(namespace_id), "uri2");

    let uri1 = tree.add_namespace("uri1");
    let attr_name = tree.add_name_ns("attr", uri1);
    assert_eq!(tree.element(bar).unwrap().get_attribute(attr_name), Some("test"));

    let text = tree.first_child(bar).unwrap();
    assert_eq!(tree.value_type(text), ValueType::Text);
    assert_eq!(tree.text_str(text), Some("baz"));
    assert_eq!(tree.text_content_str(bar), Some("baz"));
}

#[test]
fn test_build_empty_default_namespace() {
    let mut reader = Reader::new("<foo><bar xmlns=''/><char xmlns=''></char></foo>");
    let mut tree = Tree::new();
    let root = tree.build(&mut reader).unwrap();

    let children: Vec<_> = tree.children(root).collect();
    assert_eq!(children.len(), 2);
    for (node, expected) in children.iter().zip(["bar", "char"]) {
        let element = tree.element(*node).unwrap();
        let (local, namespace_id) = tree.name_parts(element.name());
        assert_eq!(local, expected);
        assert_eq!(tree.namespace_str(namespace_id), "");
        assert_eq!(tree.first_child(*node), None);
    }
}

#[test]
fn test_build_reconstructs_exactly_the_new_declarations() {
    let mut reader =
        Reader::new("<a xmlns:p='u1' xmlns:q='u2'><b xmlns:p='x1'/><c/></a>");
    let mut tree = Tree::new();
    let root = tree.build(&mut reader).unwrap();

    assert_eq!(tree.element(root).unwrap().prefixes().len(), 2);
    let children: Vec<_> = tree.children(root).collect();
    // b carries only its own rebinding, c carries nothing
    assert_eq!(tree.element(children[0]).unwrap().prefixes().len(), 1);
    assert_eq!(tree.element(children[1]).unwrap().prefixes().len(), 0);

    let p = tree.add_prefix("p");
    let x1 = tree.add_namespace("x1");
    assert_eq!(tree.element(children[0]).unwrap().get_namespace(p), Some(x1));
}

#[test]
fn test_serialize_round_trips_declarations() {
    let xml = "<n:foo xmlns:n=\"uri1\"><bar xmlns=\"uri2\" n:attr=\"test\">baz</bar></n:foo>";
    let mut reader = Reader::new(xml);
    let mut tree = Tree::new();
    let root = tree.build(&mut reader).unwrap();
    assert_eq!(tree.to_string(root).unwrap(), xml);
}

#[test]
fn test_serialize_simple_round_trips() {
    for xml in [
        "<root><a>1</a><b>2</b></root>",
        "<root xmlns:foo=\"http://example.com\"><a>1</a><foo:b>2</foo:b></root>",
        "<root xmlns=\"http://example.com\"><a>1</a><b>2</b></root>",
        "<doc a=\"A\" b=\"B\"/>",
    ] {
        let mut reader = Reader::new(xml);
        let mut tree = Tree::new();
        let root = tree.build(&mut reader).unwrap();
        assert_eq!(tree.to_string(root).unwrap(), xml);
    }
}

#[test]
fn test_compare_ignores_prefixes() {
    let mut tree = Tree::new();
    let a = {
        let mut reader = Reader::new("<a:d xmlns:a=\"u\" a:k=\"v\"><a:c>t</a:c></a:d>");
        tree.build(&mut reader).unwrap()
    };
    let b = {
        let mut reader = Reader::new("<b:d xmlns:b=\"u\" b:k=\"v\"><b:c>t</b:c></b:d>");
        tree.build(&mut reader).unwrap()
    };
    assert!(tree.compare(a, b));
}

#[test]
fn test_compare_differences() {
    let mut tree = Tree::new();
    let build = |tree: &mut Tree, xml: &str| {
        let mut reader = Reader::new(xml);
        tree.build(&mut reader).unwrap()
    };

    let base = build(&mut tree, "<d k=\"v\">t</d>");
    let different_text = build(&mut tree, "<d k=\"v\">u</d>");
    let different_attr = build(&mut tree, "<d k=\"w\">t</d>");
    let different_ns = build(&mut tree, "<d xmlns=\"u\" k=\"v\">t</d>");
    let extra_child = build(&mut tree, "<d k=\"v\">t<e/></d>");

    assert!(!tree.compare(base, different_text));
    assert!(!tree.compare(base, different_attr));
    assert!(!tree.compare(base, different_ns));
    assert!(!tree.compare(base, extra_child));
    let same = build(&mut tree, "<d k=\"v\">t</d>");
    assert!(tree.compare(base, same));
}

#[test]
fn test_build_requires_a_start_tag() {
    let mut reader = Reader::new("  ");
    let mut tree = Tree::new();
    assert!(matches!(
        tree.build(&mut reader),
        Err(Error::StructuralMismatch { .. })
    ));
}

#[test]
fn test_build_truncated_document() {
    let mut reader = Reader::new("<a><b>");
    let mut tree = Tree::new();
    assert!(matches!(
        tree.build(&mut reader),
        Err(Error::StructuralMismatch { .. })
    ));
}

#[test]
fn test_build_leaves_trailing_content_unread() {
    let mut reader = Reader::new("<a/><!--tail-->");
    let mut tree = Tree::new();
    let root = tree.build(&mut reader).unwrap();
    assert_eq!(tree.to_string(root).unwrap(), "<a/>");
    // the epilog is still there for token-mode consumers
    assert_eq!(
        reader.next_token().unwrap(),
        xpull::EventKind::Comment
    );
}
