//! Hierarchical namespaces for scoping store operations
//!
//! A namespace is an ordered sequence of string segments (e.g. domain,
//! tenant id). Records written under different namespaces never collide.

use serde::{Deserialize, Serialize};

/// Ordered sequence of string segments scoping all store operations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// Create a namespace from segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Access the segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the namespace has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Extend the namespace with one more segment
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Length-prefixed encoding of the segments
    ///
    /// Segments may contain any characters, including the separators used
    /// here: each segment is written as `{byte_len}:{segment};`, so decoding
    /// never has to scan for an unescaped delimiter. Two distinct namespaces
    /// always produce distinct encodings.
    pub(crate) fn encode(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(&segment.len().to_string());
            out.push(':');
            out.push_str(segment);
            out.push(';');
        }
        out
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Build the full storage key for a record class, namespace and key
///
/// Layout: `{class}{encoded namespace}{key_len}:{key}`. The class prefix
/// (e.g. `rec:`) keeps record kinds apart inside one database, the way
/// length-prefixing keeps namespaces and keys apart.
pub(crate) fn encode_key(class: &str, namespace: &Namespace, key: &str) -> String {
    format!("{}{}{}:{}", class, namespace.encode(), key.len(), key)
}

/// Parse a storage key back into its namespace and key
///
/// Returns `None` for keys of a different class or malformed encodings.
pub(crate) fn decode_key(class: &str, raw: &str) -> Option<(Namespace, String)> {
    let mut rest = raw.strip_prefix(class)?;
    let mut segments = Vec::new();

    loop {
        let colon = rest.find(':')?;
        let len: usize = rest[..colon].parse().ok()?;
        let payload_start = colon + 1;
        let payload_end = payload_start + len;
        if rest.len() < payload_end {
            return None;
        }
        if !rest.is_char_boundary(payload_end) {
            return None;
        }
        let payload = &rest[payload_start..payload_end];
        rest = &rest[payload_end..];

        if let Some(after) = rest.strip_prefix(';') {
            segments.push(payload.to_string());
            rest = after;
        } else if rest.is_empty() {
            // Final token carries no trailing separator: it is the key.
            return Some((Namespace { segments }, payload.to_string()));
        } else {
            return None;
        }
    }
}
