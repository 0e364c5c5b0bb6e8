//! An ordered YAML document model for image descriptors.
//!
//! A [`Document`] keeps its top-level keys in insertion order and supports
//! position-aware edits ([`Document::insert_at`], [`Document::remove`]), so a
//! rewrite pass can decide exactly where each key lands in the output.
//!
//! Values below the top level are plain [`serde_yaml::Value`]s. The source
//! lines of every top-level key are kept alongside, so keys no edit touched
//! are written back exactly as they were read, comments and quoting
//! included. Only inserted or replaced keys go through the [`formatter`].

mod layout;
pub mod formatter;

pub use formatter::EmitOptions;
pub use serde_yaml::{Mapping, Value};

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Expected a single YAML document, found {0}")]
    MultipleDocuments(usize),

    #[error("Document is empty")]
    Empty,

    #[error("Top-level node must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("Top-level keys must be strings, found {0}")]
    NonStringKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Formatting attached to a top-level key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Comment and blank lines emitted verbatim above the key.
    pub leading: Vec<String>,
    /// Emit an empty line after the key's value.
    pub blank_line_after: bool,
}

/// A YAML mapping document with ordered, annotatable top-level keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: IndexMap<String, Value>,
    annotations: HashMap<String, Annotation>,
    /// Original source lines of keys that have not been modified.
    verbatim: HashMap<String, Vec<String>>,
    header: Vec<String>,
    trailer: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single-document YAML source whose root is a mapping.
    pub fn parse(source: &str) -> Result<Self> {
        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_str(source) {
            documents.push(Value::deserialize(document)?);
        }

        let root = match documents.len() {
            0 => return Err(Error::Empty),
            1 => documents.remove(0),
            n => return Err(Error::MultipleDocuments(n)),
        };

        let mapping = match root {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Err(Error::Empty),
            other => return Err(Error::NotAMapping(kind_name(&other))),
        };

        let mut entries = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let Value::String(key) = key else {
                return Err(Error::NonStringKey(format!("{key:?}")));
            };
            entries.insert(key, value);
        }

        let mut document = Self {
            entries,
            ..Self::default()
        };

        match layout::scan(source, document.entries.len()) {
            Some(layout) => {
                document.header = layout.header;
                document.trailer = layout.trailer;
                for ((key, leading), body) in document
                    .entries
                    .keys()
                    .zip(layout.leading)
                    .zip(layout.bodies)
                {
                    document.verbatim.insert(key.clone(), body);
                    if !leading.is_empty() {
                        document.annotations.insert(
                            key.clone(),
                            Annotation {
                                leading,
                                blank_line_after: false,
                            },
                        );
                    }
                }
            }
            None => log::debug!("Could not align source lines with top-level keys; reformatting"),
        }

        Ok(document)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set `key`, keeping its position if it already exists, appending otherwise.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        self.verbatim.remove(&key);
        self.entries.insert(key, value)
    }

    /// Place `key` at `index`, moving it if it already exists.
    ///
    /// Indices past the end append, matching list-insert semantics.
    pub fn insert_at(&mut self, index: usize, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.verbatim.remove(&key);
        self.entries.shift_remove(&key);
        let index = index.min(self.entries.len());
        self.entries.shift_insert(index, key, value);
    }

    /// Remove `key` and its annotation, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.annotations.remove(key);
        self.verbatim.remove(key);
        self.entries.shift_remove(key)
    }

    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.annotations.get(key)
    }

    pub fn set_blank_line_after(&mut self, key: &str) {
        self.annotations
            .entry(key.to_string())
            .or_default()
            .blank_line_after = true;
    }

    /// Source lines of `key`, if it is unchanged since parsing.
    pub fn source_lines(&self, key: &str) -> Option<&[String]> {
        self.verbatim.get(key).map(Vec::as_slice)
    }

    /// Lines above the first key.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Lines after the last key.
    pub fn trailer(&self) -> &[String] {
        &self.trailer
    }

    /// Convert into a plain mapping value, dropping annotations.
    pub fn into_value(self) -> Value {
        Value::Mapping(
            self.entries
                .into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
        )
    }

    pub fn to_yaml_string(&self, options: &EmitOptions) -> Result<String> {
        formatter::emit(self, options)
    }
}

/// Short type name of a value, for diagnostics.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
