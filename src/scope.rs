use std::borrow::Cow;

/// The namespace URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace URI that namespace-declaration attributes are reported
/// under when `report_namespace_attributes` is enabled.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// A prefix binding in scope. `prefix: None` is the default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding<'a> {
    pub prefix: Option<Cow<'a, str>>,
    pub uri: Cow<'a, str>,
    /// The element depth whose start tag introduced this binding.
    pub declared_at_depth: usize,
}

/// Depth-indexed table of prefix bindings.
///
/// Bindings live in one flat arena; a parallel count table partitions it by
/// depth: `count_at(d)` bindings are visible at depth `d`, and the slice
/// `count_at(d - 1)..count_at(d)` holds exactly the bindings introduced by
/// the element at depth `d`. Pushes happen when a start tag is consumed,
/// pops when the matching end tag has been consumed, so the table is empty
/// again at end of document.
#[derive(Debug)]
pub(crate) struct ScopeStack<'a> {
    bindings: Vec<(Option<Cow<'a, str>>, Cow<'a, str>)>,
    // counts[d] = number of bindings visible at depth d; counts[0] == 0
    counts: Vec<usize>,
}

impl<'a> ScopeStack<'a> {
    pub(crate) fn new() -> Self {
        ScopeStack {
            bindings: Vec::new(),
            counts: vec![0],
        }
    }

    /// The depth of the deepest open scope.
    pub(crate) fn depth(&self) -> usize {
        self.counts.len() - 1
    }

    /// Open a scope for the element one deeper than the current depth.
    pub(crate) fn push_scope(&mut self) {
        self.counts.push(self.bindings.len());
    }

    /// Add a binding to the innermost scope.
    pub(crate) fn declare(&mut self, prefix: Option<Cow<'a, str>>, uri: Cow<'a, str>) {
        debug_assert!(self.counts.len() > 1, "declare before push_scope");
        self.bindings.push((prefix, uri));
        *self.counts.last_mut().unwrap() = self.bindings.len();
    }

    /// Close the innermost scope, dropping its bindings.
    pub(crate) fn pop_scope(&mut self) {
        debug_assert!(self.counts.len() > 1, "pop_scope on empty stack");
        self.counts.pop();
        self.bindings.truncate(*self.counts.last().unwrap());
    }

    /// Whether the innermost scope already declares `prefix`.
    pub(crate) fn declared_in_current_scope(&self, prefix: Option<&str>) -> bool {
        let base = self.counts[self.counts.len() - 2];
        self.bindings[base..]
            .iter()
            .any(|(p, _)| p.as_deref() == prefix)
    }

    /// Number of bindings visible at `depth`. `None` when `depth` exceeds
    /// the current depth.
    pub(crate) fn count_at(&self, depth: usize) -> Option<usize> {
        self.counts.get(depth).copied()
    }

    /// The binding at arena position `pos`, counting from the outermost.
    pub(crate) fn binding(&self, pos: usize) -> Option<NamespaceBinding<'a>> {
        let (prefix, uri) = self.bindings.get(pos)?;
        let declared_at_depth = self.counts.partition_point(|count| *count <= pos);
        Some(NamespaceBinding {
            prefix: prefix.clone(),
            uri: uri.clone(),
            declared_at_depth,
        })
    }

    /// Resolve a prefix against the visible bindings, innermost first.
    ///
    /// `xml` and `xmlns` are reserved: `xml` always resolves to the fixed
    /// XML namespace; `xmlns` is never bound. Absence of a binding is not an
    /// error here; callers decide whether that is fatal.
    pub(crate) fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE),
            Some("xmlns") => return None,
            _ => {}
        }
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_ref())
    }

    /// Resolve a prefix, preserving input-borrowed URIs without cloning.
    pub(crate) fn resolve_cow(&self, prefix: Option<&str>) -> Option<Cow<'a, str>> {
        match prefix {
            Some("xml") => return Some(Cow::Borrowed(XML_NAMESPACE)),
            Some("xmlns") => return None,
            _ => {}
        }
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| match uri {
                Cow::Borrowed(s) => Cow::Borrowed(*s),
                Cow::Owned(s) => Cow::Owned(s.clone()),
            })
    }

    /// The default namespace URI; the empty string when unbound (or bound
    /// to the empty URI, which un-binds it for that scope).
    pub(crate) fn resolve_default(&self) -> &str {
        self.resolve(None).unwrap_or("")
    }

    /// A prefix usable to qualify an element in `uri`. The default prefix
    /// is preferred when it maps to `uri`; shadowed bindings are skipped.
    pub(crate) fn prefix_for_element(&self, uri: &str) -> Option<Option<&str>> {
        if self.resolve_default() == uri {
            return Some(None);
        }
        self.prefix_for_attribute(uri).map(Some)
    }

    /// A non-default prefix usable to qualify an attribute in `uri`.
    /// Attributes without a prefix have no namespace, so the default
    /// binding never qualifies.
    pub(crate) fn prefix_for_attribute(&self, uri: &str) -> Option<&str> {
        if uri == XML_NAMESPACE {
            return Some("xml");
        }
        for (prefix, bound) in self.bindings.iter().rev() {
            if let Some(prefix) = prefix.as_deref() {
                if *bound == uri && self.resolve(Some(prefix)) == Some(uri) {
                    return Some(prefix);
                }
            }
        }
        None
    }

    /// Whether `prefix` currently resolves to anything, used to keep
    /// generated prefixes collision-free.
    pub(crate) fn is_prefix_taken(&self, prefix: &str) -> bool {
        prefix == "xml"
            || prefix == "xmlns"
            || self
                .bindings
                .iter()
                .any(|(p, _)| p.as_deref() == Some(prefix))
    }
}
