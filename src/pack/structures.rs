use std::collections::{BTreeMap, HashMap};

/// Magic bytes at offset 0 of every container buffer
pub const MAGIC: &[u8; 7] = b"RUNPACK";

/// Fixed archive header: magic + total length (u32) + entry count (u32)
pub const HEADER_SIZE: usize = MAGIC.len() + 4 + 4;

/// Fixed entry record prefix: path length (u16) + content length (u32) + flag (u8)
pub const ENTRY_PREFIX_SIZE: usize = 2 + 4 + 1;

/// Longest path allowed, in UTF-8 bytes
pub const MAX_PATH_LEN: usize = u16::MAX as usize;

/// Largest combined content size allowed, in bytes
pub const MAX_CONTENT_LEN: u64 = u32::MAX as u64;

/// Entry record flag values
pub const FLAG_TEXT: u8 = 0;
pub const FLAG_BINARY: u8 = 1;

/// The content of a single entry.
///
/// Both variants travel as raw bytes; the variant decides how the bytes are
/// handed back after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    /// Classify bytes read from an external source.
    ///
    /// Valid UTF-8 becomes [`Content::Text`], everything else [`Content::Binary`].
    pub fn detect(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Content::Text(text),
            Err(e) => Content::Binary(e.into_bytes()),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Content::Binary(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(s) => s.as_bytes(),
            Content::Binary(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(s) => s.into_bytes(),
            Content::Binary(b) => b,
        }
    }

    /// Human-readable kind, as shown in verbose listings
    pub fn kind(&self) -> &'static str {
        if self.is_binary() { "binary" } else { "text" }
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Binary(value)
    }
}

impl From<&[u8]> for Content {
    fn from(value: &[u8]) -> Self {
        Content::Binary(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Content {
    fn from(value: [u8; N]) -> Self {
        Content::Binary(value.to_vec())
    }
}

/// A single path/content pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub content: Content,
}

impl Entry {
    pub fn new(path: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn is_binary(&self) -> bool {
        self.content.is_binary()
    }
}

/// Ordered collection of entries keyed by path.
///
/// Iteration follows insertion order. Paths are unique: inserting a path that
/// is already present replaces its content and keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMap {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert an entry, returning the content it replaced, if any
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        content: impl Into<Content>,
    ) -> Option<Content> {
        let path = path.into();
        let content = content.into();

        if let Some(&pos) = self.index.get(&path) {
            return Some(std::mem::replace(&mut self.entries[pos].content, content));
        }

        self.index.insert(path.clone(), self.entries.len());
        self.entries.push(Entry { path, content });
        None
    }

    pub fn get(&self, path: &str) -> Option<&Content> {
        self.index.get(path).map(|&pos| &self.entries[pos].content)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a EntryMap {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for EntryMap {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Content>> FromIterator<(K, V)> for EntryMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = EntryMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<Content>> Extend<(K, V)> for EntryMap {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (path, content) in iter {
            self.insert(path, content);
        }
    }
}

impl FromIterator<Entry> for EntryMap {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        iter.into_iter().map(|e| (e.path, e.content)).collect()
    }
}

impl<K: Into<String>, V: Into<Content>> From<Vec<(K, V)>> for EntryMap {
    fn from(value: Vec<(K, V)>) -> Self {
        value.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Content>, const N: usize> From<[(K, V); N]> for EntryMap {
    fn from(value: [(K, V); N]) -> Self {
        value.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Content>> From<BTreeMap<K, V>> for EntryMap {
    fn from(value: BTreeMap<K, V>) -> Self {
        value.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Content>, S> From<HashMap<K, V, S>> for EntryMap {
    fn from(value: HashMap<K, V, S>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Vec<Entry>> for EntryMap {
    fn from(value: Vec<Entry>) -> Self {
        value.into_iter().collect()
    }
}

/// Bring any supported input shape into the canonical [`EntryMap`] form.
///
/// An `EntryMap` is returned unchanged; pair lists and maps are converted in
/// their own iteration order. Nothing is validated here.
pub fn normalize(input: impl Into<EntryMap>) -> EntryMap {
    input.into()
}
