//! Namespace-scoped cache keys.
//!
//! A key addresses a cached record by `(namespace, index_field,
//! index_value)`, where the field can be any indexed field, not just the
//! primary key. The private inner struct means a key cannot be built
//! without a namespace.

/// Separator between key segments in the encoded form.
///
/// ASCII unit separator; never appears in entity names or field names.
const SEPARATOR: char = '\u{1f}';

/// A cache key scoped to a service namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    inner: KeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyInner {
    namespace: String,
    index_field: String,
    index_value: String,
}

impl CacheKey {
    /// Create a new cache key.
    ///
    /// This is the only way to construct a `CacheKey`; the namespace is
    /// mandatory. `namespace` and `index_field` must not contain the
    /// separator character; `index_value` may contain anything.
    pub fn new(
        namespace: impl Into<String>,
        index_field: impl Into<String>,
        index_value: impl Into<String>,
    ) -> Self {
        Self {
            inner: KeyInner {
                namespace: namespace.into(),
                index_field: index_field.into(),
                index_value: index_value.into(),
            },
        }
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn index_field(&self) -> &str {
        &self.inner.index_field
    }

    pub fn index_value(&self) -> &str {
        &self.inner.index_value
    }

    /// Encode to a flat string for backends that store string keys.
    ///
    /// Format: `namespace<US>index_field<US>index_value`. Keys sort by
    /// namespace first, so range scans can walk one namespace's entries.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(
            self.inner.namespace.len()
                + self.inner.index_field.len()
                + self.inner.index_value.len()
                + 2,
        );
        out.push_str(&self.inner.namespace);
        out.push(SEPARATOR);
        out.push_str(&self.inner.index_field);
        out.push(SEPARATOR);
        out.push_str(&self.inner.index_value);
        out
    }

    /// Decode a key from its encoded form.
    ///
    /// Returns `None` if the string does not carry exactly three segments.
    pub fn decode(encoded: &str) -> Option<Self> {
        let mut parts = encoded.splitn(3, SEPARATOR);
        let namespace = parts.next()?;
        let index_field = parts.next()?;
        let index_value = parts.next()?;
        Some(Self::new(namespace, index_field, index_value))
    }

    /// Prefix matching every encoded key in a namespace; supports bulk purge.
    pub fn namespace_prefix(namespace: &str) -> String {
        let mut prefix = String::with_capacity(namespace.len() + 1);
        prefix.push_str(namespace);
        prefix.push(SEPARATOR);
        prefix
    }
}
