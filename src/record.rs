//! Records and the working set they accumulate into.
//!
//! A `Record` is an ordered mapping from field name to an optional value.
//! Field sets vary between records: a field can be absent, present but null,
//! or present with a (possibly empty) string. Equality ignores field order.

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set `key` to `value`.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, Some(value.into()));
        self
    }

    /// Builder: set `key` to null.
    pub fn with_null(mut self, key: &str) -> Self {
        self.set(key, None);
        self
    }

    /// Set a field, keeping its position if it already exists.
    pub fn set(&mut self, key: &str, value: Option<String>) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    /// Value of `key`, `None` when the field is absent or null.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).flatten()
    }

    /// `None` when the field is absent, `Some(None)` when it is null.
    pub fn entry(&self, key: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// True when the field is absent, null or empty.
    pub fn is_blank(&self, key: &str) -> bool {
        self.get(key).map_or(true, str::is_empty)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrite-merge: every field of `other` replaces the field of the same
    /// name here (nulls included), new fields are appended in `other`'s order.
    pub fn merge(&mut self, other: &Record) {
        for (key, value) in &other.fields {
            self.set(key, value.clone());
        }
    }

    /// `defaults` overlaid with `self`, keeping the defaults' field order.
    pub fn over(self, defaults: &Record) -> Record {
        let mut merged = defaults.clone();
        merged.merge(&self);
        merged
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.entry(k) == Some(v))
    }
}

impl Eq for Record {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(&k.into(), Some(v.into()));
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The merged table being built during one run.
///
/// Records are appended or updated in place; there is no way to remove one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    records: Vec<Record>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return its position.
    pub fn push(&mut self, record: Record) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Update one field of the record at `index`; out-of-range indices are ignored.
    pub fn set_field(&mut self, index: usize, key: &str, value: Option<String>) {
        if let Some(record) = self.records.get_mut(index) {
            record.set(key, value);
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for WorkingSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}
