//! Field schema extraction.
//!
//! Turns the user-supplied description of a model's inputs into an ordered
//! list of [`FieldSpec`]s. Two shapes are accepted:
//!
//! - a JSON object, `{"age": 0, "income": 0}`: keys in insertion order,
//!   values ignored
//! - a JSON array of strings, `["age", "income"]`: list order
//!
//! Field order is the feature order of the generated service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaFormatError;

/// Type a declared field is bound to in the generated request schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Numeric,
}

impl FieldType {
    /// Type annotation used in the generated service source.
    pub fn annotation(&self) -> &'static str {
        match self {
            Self::Numeric => "float",
        }
    }
}

/// One declared model input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub raw_name: String,
    pub identifier: String,
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn numeric(raw_name: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        Self {
            identifier: sanitize_identifier(&raw_name),
            raw_name,
            field_type: FieldType::Numeric,
        }
    }

    /// Raw name to expose as an alias, when it differs from the identifier.
    pub fn alias(&self) -> Option<&str> {
        (self.raw_name != self.identifier).then_some(self.raw_name.as_str())
    }
}

/// Shape detected in the schema text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSchema {
    Object(Vec<String>),
    List(Vec<String>),
    Invalid(String),
}

impl ParsedSchema {
    /// Classify schema text with a single parse.
    pub fn parse(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return Self::Invalid(format!("not valid JSON: {}", e)),
        };

        match value {
            Value::Object(map) => Self::Object(map.keys().cloned().collect()),
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        Value::String(name) => names.push(name),
                        other => {
                            return Self::Invalid(format!(
                                "array element {} is {}, not a string",
                                i,
                                json_kind(&other)
                            ))
                        }
                    }
                }
                Self::List(names)
            }
            other => Self::Invalid(format!("top-level value is {}", json_kind(&other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Reserved words of the generated service language.
const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

fn is_usable_identifier(identifier: &str) -> bool {
    match identifier.chars().next() {
        None => false,
        Some(first) if first.is_ascii_digit() => false,
        Some(_) => !RESERVED.contains(&identifier),
    }
}

/// Extract the ordered field list from schema text.
///
/// Rejects malformed text, empty field lists, identifiers that cannot name a
/// generated member, and distinct raw names that normalize to the same
/// identifier.
pub fn extract_fields(text: &str) -> Result<Vec<FieldSpec>, SchemaFormatError> {
    let names = match ParsedSchema::parse(text.trim()) {
        ParsedSchema::Object(names) | ParsedSchema::List(names) => names,
        ParsedSchema::Invalid(detail) => {
            return Err(SchemaFormatError::Malformed {
                text: text.to_string(),
                detail,
            })
        }
    };

    if names.is_empty() {
        return Err(SchemaFormatError::Empty {
            text: text.to_string(),
        });
    }

    let mut seen: HashMap<String, String> = HashMap::with_capacity(names.len());
    let mut fields = Vec::with_capacity(names.len());

    for name in names {
        let field = FieldSpec::numeric(name);

        if !is_usable_identifier(&field.identifier) {
            return Err(SchemaFormatError::UnusableIdentifier {
                text: text.to_string(),
                field: field.raw_name,
                identifier: field.identifier,
            });
        }

        if let Some(first) = seen.get(&field.identifier) {
            return Err(SchemaFormatError::IdentifierCollision {
                text: text.to_string(),
                identifier: field.identifier.clone(),
                first: first.clone(),
                second: field.raw_name,
            });
        }

        seen.insert(field.identifier.clone(), field.raw_name.clone());
        fields.push(field);
    }

    Ok(fields)
}
