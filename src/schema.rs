//! Placeholder schema model: typed field declarations for a template's
//! placeholders, plus validation, reconciliation and default handling.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Value kinds a placeholder field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Short string input
    Str,
    /// Long text input
    Text,
    /// Integer input
    Int,
    /// Float input
    Float,
    /// Boolean input
    Bool,
    /// Single choice from a fixed option list
    Choice,
    /// Multiple choices from a fixed option list
    MultiChoice,
}

/// Wire names of the recognized field kinds.
pub const SUPPORTED_KINDS: [&str; 7] =
    ["str", "text", "int", "float", "bool", "choice", "multichoice"];

impl FieldKind {
    /// Parses a wire name into a kind. Returns `None` for unrecognized names.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "str" => Some(Self::Str),
            "text" => Some(Self::Text),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" => Some(Self::Bool),
            "choice" => Some(Self::Choice),
            "multichoice" => Some(Self::MultiChoice),
            _ => None,
        }
    }

    /// Returns the wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Choice => "choice",
            Self::MultiChoice => "multichoice",
        }
    }

    /// Whether this kind draws its values from an option list.
    pub fn is_choice(self) -> bool {
        matches!(self, Self::Choice | Self::MultiChoice)
    }
}

/// A single placeholder declaration within a schema.
///
/// The kind is carried as a raw string (wire key `type`) so that an
/// unrecognized kind surfaces as a validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceholderField {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

fn default_kind() -> String {
    FieldKind::Str.as_str().to_string()
}

impl PlaceholderField {
    /// Creates the default declaration for a newly discovered placeholder:
    /// a required short-text field with an empty default.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: default_kind(),
            required: true,
            default: Some(json!("")),
            description: format!("Value for {}", name),
            options: Vec::new(),
        }
    }

    /// Returns the parsed kind, or `None` when the declared kind is
    /// unrecognized.
    pub fn field_kind(&self) -> Option<FieldKind> {
        FieldKind::parse(&self.kind)
    }
}

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// Validates a placeholder schema and returns the list of violations.
///
/// Validation is exhaustive: all violations are collected rather than
/// stopping at the first, so one pass surfaces every issue.
pub fn validate_schema(schema: &[PlaceholderField]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen_names: HashSet<&str> = HashSet::new();

    for (index, field) in schema.iter().enumerate() {
        if field.name.is_empty() {
            errors.push(format!("Field {} is missing a 'name'", index));
            continue;
        }

        if !seen_names.insert(field.name.as_str()) {
            errors.push(format!("Duplicate field name: {}", field.name));
        }

        if !identifier_regex().is_match(&field.name) {
            errors.push(format!(
                "Invalid field name '{}': must be a valid identifier",
                field.name
            ));
        }

        match field.field_kind() {
            None => errors.push(format!(
                "Unsupported type '{}' for field '{}'",
                field.kind, field.name
            )),
            Some(kind) if kind.is_choice() && field.options.is_empty() => {
                errors.push(format!(
                    "Field '{}' with type '{}' must have a non-empty 'options' list",
                    field.name, field.kind
                ));
            }
            Some(_) => {}
        }
    }

    errors
}

/// Merges an existing schema with the placeholders discovered in edited
/// template text.
///
/// Fields for still-discovered names are preserved unchanged (including user
/// customization) in discovered order; newly discovered names get a default
/// declaration; fields whose placeholder disappeared are dropped.
pub fn reconcile_schema(
    existing: &[PlaceholderField],
    discovered: &[String],
) -> Vec<PlaceholderField> {
    discovered
        .iter()
        .map(|name| {
            existing
                .iter()
                .find(|field| field.name == *name)
                .cloned()
                .unwrap_or_else(|| PlaceholderField::new(name))
        })
        .collect()
}

/// Builds a basic schema from placeholder names: one required short-text
/// field per name, in the given order.
pub fn auto_schema(placeholders: &[String]) -> Vec<PlaceholderField> {
    placeholders.iter().map(|name| PlaceholderField::new(name)).collect()
}

/// Returns the default value mapping for a schema.
///
/// A declared default wins whenever the attribute is set and non-null, even
/// when it is an explicit empty string, zero or false. Otherwise a
/// kind-appropriate default is synthesized.
pub fn default_values(
    schema: &[PlaceholderField],
) -> serde_json::Map<String, serde_json::Value> {
    let mut defaults = serde_json::Map::new();
    for field in schema {
        let value = match &field.default {
            Some(value) if !value.is_null() => value.clone(),
            _ => synthesized_default(field),
        };
        defaults.insert(field.name.clone(), value);
    }
    defaults
}

fn synthesized_default(field: &PlaceholderField) -> serde_json::Value {
    match field.field_kind() {
        Some(FieldKind::Int) => json!(0),
        Some(FieldKind::Float) => json!(0.0),
        Some(FieldKind::Bool) => json!(false),
        Some(FieldKind::Choice) => match field.options.first() {
            Some(option) => json!(option),
            None => json!(""),
        },
        Some(FieldKind::MultiChoice) => match field.options.first() {
            Some(option) => json!([option]),
            None => json!([]),
        },
        _ => json!(""),
    }
}

/// Parses a stored placeholder schema from its JSON encoding.
///
/// Absent, blank or malformed JSON is treated as "no schema".
pub fn schema_from_json(raw: Option<&str>) -> Option<Vec<PlaceholderField>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_is_tolerated_by_serde() {
        let fields = schema_from_json(Some(r#"[{"name": "x", "type": "matrix"}]"#))
            .expect("structurally valid schema");
        assert_eq!(fields[0].kind, "matrix");
        assert_eq!(fields[0].field_kind(), None);
        let errors = validate_schema(&fields);
        assert!(errors.iter().any(|e| e.contains("Unsupported type 'matrix'")));
    }

    #[test]
    fn test_malformed_schema_json_means_no_schema() {
        assert!(schema_from_json(Some("{not json")).is_none());
        assert!(schema_from_json(Some("   ")).is_none());
        assert!(schema_from_json(None).is_none());
    }
}
