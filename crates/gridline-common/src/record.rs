//! Row records and dotted-path field access.
//!
//! The sort engine and filter layer consume rows as named-field records, not
//! as raw cell coordinates. A field reference is either a top-level key or a
//! dotted path (`"address.city"`); paths are compiled once into segment lists
//! and resolved lazily. Resolution through a missing intermediate yields
//! nothing, which callers treat as null (and which sorts last by default).

use rustc_hash::FxHashMap;

use crate::Value;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One named slot of a record: a leaf value or a nested record.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Value(Value),
    Nested(Record),
}

impl Field {
    pub fn value<V: Into<Value>>(v: V) -> Self {
        Field::Value(v.into())
    }
}

/// A row of named fields.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: FxHashMap<String, Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, convenient in tests and bulk loads.
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), Field::Value(value.into()));
        self
    }

    pub fn with_nested<K: Into<String>>(mut self, key: K, nested: Record) -> Self {
        self.fields.insert(key.into(), Field::Nested(nested));
        self
    }

    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.fields.insert(key.into(), Field::Value(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a compiled path against this record. Missing segments and
    /// paths that dead-end in a nested record resolve to `None`.
    pub fn resolve<'a>(&'a self, path: &FieldPath) -> Option<&'a Value> {
        let mut current = self;
        let (last, intermediate) = path.segments.split_last()?;
        for segment in intermediate {
            match current.fields.get(segment) {
                Some(Field::Nested(nested)) => current = nested,
                _ => return None,
            }
        }
        match current.fields.get(last) {
            Some(Field::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Write a value at a dotted path, creating intermediate records.
    /// A leaf value sitting where an intermediate record is needed is
    /// replaced by a nested record.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) {
        let Some((last, intermediate)) = path.segments.split_last() else {
            return;
        };
        let mut current = self;
        for segment in intermediate {
            let entry = current
                .fields
                .entry(segment.clone())
                .or_insert_with(|| Field::Nested(Record::new()));
            if !matches!(entry, Field::Nested(_)) {
                *entry = Field::Nested(Record::new());
            }
            match entry {
                Field::Nested(nested) => current = nested,
                Field::Value(_) => unreachable!("entry was just normalized to Nested"),
            }
        }
        current.fields.insert(last.clone(), Field::Value(value));
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut rec = Record::new();
        for (k, v) in iter {
            rec.set(k, v);
        }
        rec
    }
}

/// A dotted field path compiled into its segments.
///
/// Compile once per sort key or filter condition, resolve per row.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse<S: Into<String>>(raw: S) -> Self {
        let raw = raw.into();
        let segments = raw.split('.').map(str::to_string).collect();
        Self { raw, segments }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
