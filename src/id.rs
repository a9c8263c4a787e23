use ahash::HashMap;

/// Conversion between an id type and its index in the interning table.
pub(crate) trait IdIndex<T> {
    fn to_id(index: usize) -> T;
    fn from_id(id: T) -> usize;
}

/// Interning table: a value is stored once and identified by a small
/// copyable id afterwards.
pub(crate) struct IdMap<K: Copy + IdIndex<K>, V: Eq + std::hash::Hash + Clone> {
    by_id: Vec<V>,
    by_value: HashMap<V, K>,
}

impl<K: Copy + IdIndex<K>, V: Eq + std::hash::Hash + Clone> IdMap<K, V> {
    pub(crate) fn new() -> Self {
        IdMap {
            by_id: Vec::new(),
            by_value: HashMap::default(),
        }
    }

    pub(crate) fn get_id(&mut self, value: V) -> K {
        if let Some(id) = self.by_value.get(&value) {
            *id
        } else {
            let id = K::to_id(self.by_id.len());
            self.by_value.insert(value.clone(), id);
            self.by_id.push(value);
            id
        }
    }

    #[inline]
    pub(crate) fn get_value(&self, id: K) -> &V {
        &self.by_id[K::from_id(id)]
    }
}

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(u32);

        impl IdIndex<$name> for $name {
            fn to_id(index: usize) -> $name {
                $name(index as u32)
            }

            fn from_id(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

id_type!(
    /// Id uniquely identifying a namespace URI within one [`Tree`](crate::Tree).
    NamespaceId
);
id_type!(
    /// Id uniquely identifying a prefix within one [`Tree`](crate::Tree).
    PrefixId
);
id_type!(
    /// Id uniquely identifying a `(namespace, local name)` pair within one
    /// [`Tree`](crate::Tree).
    NameId
);

/// An expanded name: local name plus namespace. Prefixes take no part in
/// name identity.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct Name {
    pub(crate) local: String,
    pub(crate) namespace_id: NamespaceId,
}

impl Name {
    pub(crate) fn new(local: impl Into<String>, namespace_id: NamespaceId) -> Self {
        Name {
            local: local.into(),
            namespace_id,
        }
    }
}

pub(crate) type NamespaceLookup = IdMap<NamespaceId, String>;
pub(crate) type PrefixLookup = IdMap<PrefixId, String>;
pub(crate) type NameLookup = IdMap<NameId, Name>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_map() {
        let mut map = IdMap::<NamespaceId, String>::new();
        let id1 = map.get_id("foo".to_string());
        let id2 = map.get_id("bar".to_string());
        let id3 = map.get_id("foo".to_string());
        assert_eq!(id1, id3);
        assert_ne!(id1, id2);
        assert_eq!(map.get_value(id1), "foo");
        assert_eq!(map.get_value(id2), "bar");
    }

    #[test]
    fn test_name_interning() {
        let mut namespaces = NamespaceLookup::new();
        let ns = namespaces.get_id("http://example.com".to_string());
        let mut names = NameLookup::new();
        let a = names.get_id(Name::new("a", ns));
        let a_again = names.get_id(Name::new("a", ns));
        assert_eq!(a, a_again);
    }
}
