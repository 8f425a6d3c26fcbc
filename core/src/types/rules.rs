use crate::error::{Dcm2TablesError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Separator between the group and field parts of a compound specifier
pub const SPEC_SEPARATOR: char = '_';

/// Table name to ordered list of attribute specifiers
///
/// Loaded from a JSON document shaped `{"<table>": ["Attr", ...], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RulesDictionary {
    tables: HashMap<String, Vec<String>>,
}

impl RulesDictionary {
    /// Creates an empty rules dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a rules dictionary from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Dcm2TablesError::Rules(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Parses a rules dictionary from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Dcm2TablesError::Rules(e.to_string()))
    }

    /// Adds or replaces the attribute list of a table
    pub fn insert<S: Into<String>>(
        &mut self,
        table: impl Into<String>,
        attributes: impl IntoIterator<Item = S>,
    ) {
        self.tables.insert(
            table.into(),
            attributes.into_iter().map(Into::into).collect(),
        );
    }

    /// Builder-style variant of [`RulesDictionary::insert`]
    pub fn with_table<S: Into<String>>(
        mut self,
        table: impl Into<String>,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.insert(table, attributes);
        self
    }

    /// Attribute specifiers configured for a table, if the table is known
    pub fn attributes(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }
}

/// A parsed attribute specifier
///
/// `Group_Field` names a field read from the first item of a sub-sequence
/// (or of a nested JSON object). Anything else is a plain keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSpec<'a> {
    Keyword(&'a str),
    Compound { group: &'a str, field: &'a str },
}

impl<'a> AttributeSpec<'a> {
    /// Splits a specifier at its separator
    ///
    /// A specifier is compound only when it has exactly one separator with
    /// non-empty text on both sides.
    pub fn parse(spec: &'a str) -> Self {
        match spec.split_once(SPEC_SEPARATOR) {
            Some((group, field))
                if !group.is_empty() && !field.is_empty() && !field.contains(SPEC_SEPARATOR) =>
            {
                AttributeSpec::Compound { group, field }
            }
            _ => AttributeSpec::Keyword(spec),
        }
    }
}
