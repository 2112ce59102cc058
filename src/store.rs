//! In-memory record model.
//!
//! A [`Record`] is one `@type{key, ...}` entry of a `.bib` database and a
//! [`RecordStore`] is the keyed collection built by the record parser.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Raised when a record already holds a field with the same name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot add field '{field}' to '{key}': it already exists")]
pub struct DuplicateFieldError {
    pub key: String,
    pub field: String,
}

/// Raised when a store already holds a record with the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot add entry '{key}': the bibkey already exists")]
pub struct DuplicateKeyError {
    pub key: String,
}

/// Normalizes a key or field name: trimmed and lowercased.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// The rendering variant of a record, derived from its free-form type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Article,
    Book,
    /// `conference` and `inproceedings`
    InProceedings,
    InCollection,
    Patent,
    /// `mastersthesis` and `phdthesis`
    Thesis,
    Manual,
    Online,
    Misc,
    Unknown,
}

impl EntryKind {
    /// Maps a lowercased entry type to its rendering variant.
    pub fn from_type(entry_type: &str) -> Self {
        match entry_type {
            "article" => EntryKind::Article,
            "book" => EntryKind::Book,
            "conference" | "inproceedings" => EntryKind::InProceedings,
            "incollection" => EntryKind::InCollection,
            "patent" => EntryKind::Patent,
            "mastersthesis" | "phdthesis" => EntryKind::Thesis,
            "manual" => EntryKind::Manual,
            "online" => EntryKind::Online,
            "misc" => EntryKind::Misc,
            _ => EntryKind::Unknown,
        }
    }
}

/// A single bibliographic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    entry_type: String,
    key: String,
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Creates an empty record. Type and key are case-folded, the key is trimmed.
    pub fn new(entry_type: &str, key: &str) -> Self {
        Self {
            entry_type: normalize_key(entry_type),
            key: normalize_key(key),
            fields: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The lowercased type identifier, e.g. `article`.
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::from_type(&self.entry_type)
    }

    /// Adds a field. Field names are case-folded and must be unique.
    pub fn add_field(&mut self, name: &str, value: &str) -> Result<(), DuplicateFieldError> {
        let name = normalize_key(name);
        if self.fields.contains_key(&name) {
            return Err(DuplicateFieldError {
                key: self.key.clone(),
                field: name,
            });
        }
        self.fields.insert(name, value.to_string());
        Ok(())
    }

    /// Returns the raw value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&normalize_key(name)).map(String::as_str)
    }

    /// Returns the value of a field only when it is present and non-empty.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(&normalize_key(name))
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Keyed collection of records, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, rejecting keys that are already present.
    pub fn insert(&mut self, record: Record) -> Result<(), DuplicateKeyError> {
        if self.index.contains_key(record.key()) {
            return Err(DuplicateKeyError {
                key: record.key().to_string(),
            });
        }
        self.index.insert(record.key().to_string(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Looks up a record; the key is trimmed and case-folded first.
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.index
            .get(&normalize_key(key))
            .map(|&i| &self.records[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
