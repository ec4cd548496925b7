//! NASL arrays: an integer-indexed part and a text-keyed part.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::Value;
use super::text;

/// Collection key. Text keys are the raw bytes of either text kind and
/// may hold bytes outside ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Text(Vec<u8>),
}

impl Key {
    pub fn as_nasl(&self) -> String {
        match self {
            Key::Int(n) => super::integer_literal(*n),
            Key::Text(bytes) => text::single_quoted(bytes),
        }
    }

    fn display_bytes(&self) -> Vec<u8> {
        match self {
            Key::Int(n) => n.to_string().into_bytes(),
            Key::Text(bytes) => bytes.clone(),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

/// Ordered mapping from [`Key`] to [`Value`].
///
/// Iteration yields integer keys in ascending order, then text keys in
/// insertion order. Re-inserting an existing key overwrites in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    indexed: BTreeMap<i64, Value>,
    named: IndexMap<Vec<u8>, Value>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.indexed.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.named.is_empty()
    }

    /// Missing keys read as `Absent`.
    pub fn get(&self, key: &Key) -> Value {
        let found = match key {
            Key::Int(n) => self.indexed.get(n),
            Key::Text(bytes) => self.named.get(bytes),
        };
        found.cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        match key {
            Key::Int(n) => self.indexed.contains_key(n),
            Key::Text(bytes) => self.named.contains_key(bytes),
        }
    }

    /// Returns the previous value stored under `key`, if any.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        match key {
            Key::Int(n) => self.indexed.insert(n, value),
            Key::Text(bytes) => self.named.insert(bytes, value),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &Value)> {
        self.indexed
            .iter()
            .map(|(n, value)| (Key::Int(*n), value))
            .chain(
                self.named
                    .iter()
                    .map(|(bytes, value)| (Key::Text(bytes.clone()), value)),
            )
    }

    pub(crate) fn display_bytes(&self) -> Vec<u8> {
        if self.is_empty() {
            return b"[ ]".to_vec();
        }
        let mut out = b"[ ".to_vec();
        for (position, (key, value)) in self.iter().enumerate() {
            if position > 0 {
                out.extend_from_slice(b", ");
            }
            out.extend_from_slice(&key.display_bytes());
            out.extend_from_slice(b": ");
            match value {
                Value::PureText(bytes) | Value::ImpureText(bytes) => {
                    out.push(b'\'');
                    out.extend_from_slice(bytes);
                    out.push(b'\'');
                }
                other => out.extend_from_slice(&other.display_bytes()),
            }
        }
        out.extend_from_slice(b" ]");
        out
    }

    pub(crate) fn as_nasl(&self) -> String {
        let items: Vec<String> = self
            .iter()
            .map(|(key, value)| format!("{}, {}", key.as_nasl(), value.as_nasl()))
            .collect();
        format!("make_array({})", items.join(", "))
    }
}

impl FromIterator<(Key, Value)> for Collection {
    fn from_iter<T: IntoIterator<Item = (Key, Value)>>(iter: T) -> Self {
        let mut collection = Collection::new();
        for (key, value) in iter {
            collection.insert(key, value);
        }
        collection
    }
}
