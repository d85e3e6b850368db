//! Prompt composition: orchestrates placeholder extraction, value
//! validation, default filling and rendering into a single result object.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{self, FieldKind, PlaceholderField};
use crate::template::MiniJinjaRenderer;

/// Outcome of a single composition call.
///
/// `rendered` is populated only when both error lists are empty; a
/// render-time failure is reported in-band inside `rendered` itself (see
/// [`crate::template::TEMPLATE_ERROR_PREFIX`]).
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CompositionResult {
    pub rendered: String,
    pub errors: Vec<String>,
    pub missing_required: Vec<String>,
}

impl CompositionResult {
    /// Whether validation outcomes withhold rendering.
    pub fn is_blocked(&self) -> bool {
        !self.errors.is_empty() || !self.missing_required.is_empty()
    }
}

/// Composes prompts by filling placeholders with caller-supplied values.
///
/// Pure with respect to external state: no I/O, no shared mutable state, so
/// callers may invoke [`Composer::compose`] concurrently without
/// coordination.
pub struct Composer {
    engine: MiniJinjaRenderer,
}

impl Composer {
    pub fn new(engine: MiniJinjaRenderer) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MiniJinjaRenderer {
        &self.engine
    }

    /// Composes a prompt from a template and a value mapping.
    ///
    /// With a schema, values are validated field by field and schema defaults
    /// fill in absent values before rendering. Without one, every extracted
    /// placeholder is implicitly required. Rendering is withheld while
    /// either error list is non-empty; no failure escapes as an error.
    pub fn compose(
        &self,
        template: &str,
        values: &Map<String, Value>,
        schema: Option<&[PlaceholderField]>,
    ) -> CompositionResult {
        let mut result = CompositionResult::default();
        let schema = schema.filter(|fields| !fields.is_empty());

        if let Some(fields) = schema {
            validate_values(fields, values, &mut result);
            if result.is_blocked() {
                return result;
            }

            let mut context = schema::default_values(fields);
            for (key, value) in values {
                if !value.is_null() {
                    context.insert(key.clone(), value.clone());
                }
            }
            result.rendered = self.engine.render_prompt(template, &context);
        } else {
            let placeholders = self.engine.extract_placeholders(template);
            result.missing_required = placeholders
                .into_iter()
                .filter(|name| values.get(name).map_or(true, Value::is_null))
                .collect();
            if result.is_blocked() {
                return result;
            }
            result.rendered = self.engine.render_prompt(template, values);
        }

        result
    }
}

impl Default for Composer {
    fn default() -> Self {
        Composer::new(MiniJinjaRenderer::new())
    }
}

/// A value counts as missing when it is absent, null, or an empty string.
/// Numeric zero, false and non-empty sequences are present.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(raw)) => raw.is_empty(),
        Some(_) => false,
    }
}

/// Validates supplied values against the schema, accumulating every
/// violation; no field stops the pass.
fn validate_values(
    fields: &[PlaceholderField],
    values: &Map<String, Value>,
    result: &mut CompositionResult,
) {
    for field in fields {
        let value = values.get(&field.name);

        if field.required && is_blank(value) {
            result.missing_required.push(field.name.clone());
            continue;
        }
        // Empty optional fields are not validated.
        let Some(value) = value else { continue };
        if is_blank(Some(value)) {
            continue;
        }

        match field.field_kind() {
            Some(FieldKind::Int) => validate_int(field, value, &mut result.errors),
            Some(FieldKind::Float) => validate_float(field, value, &mut result.errors),
            Some(FieldKind::Bool) => validate_bool(field, value, &mut result.errors),
            Some(FieldKind::Choice) => validate_choice(field, value, &mut result.errors),
            Some(FieldKind::MultiChoice) => {
                validate_multichoice(field, value, &mut result.errors)
            }
            _ => {}
        }
    }
}

fn validate_int(field: &PlaceholderField, value: &Value, errors: &mut Vec<String>) {
    let parseable = match value {
        Value::Number(_) => true,
        Value::String(raw) => raw.trim().parse::<i64>().is_ok(),
        _ => false,
    };
    if !parseable {
        errors.push(format!(
            "Invalid integer value for '{}': {}",
            field.name,
            display_value(value)
        ));
    }
}

fn validate_float(field: &PlaceholderField, value: &Value, errors: &mut Vec<String>) {
    let parseable = match value {
        Value::Number(_) => true,
        Value::String(raw) => raw.trim().parse::<f64>().is_ok(),
        _ => false,
    };
    if !parseable {
        errors.push(format!(
            "Invalid float value for '{}': {}",
            field.name,
            display_value(value)
        ));
    }
}

const BOOLEAN_WORDS: [&str; 6] = ["true", "false", "1", "0", "yes", "no"];

fn validate_bool(field: &PlaceholderField, value: &Value, errors: &mut Vec<String>) {
    // Only textual representations are constrained; JSON booleans pass as-is.
    if let Value::String(raw) = value {
        if !BOOLEAN_WORDS.contains(&raw.to_lowercase().as_str()) {
            errors.push(format!("Invalid boolean value for '{}': {}", field.name, raw));
        }
    }
}

fn validate_choice(field: &PlaceholderField, value: &Value, errors: &mut Vec<String>) {
    let is_member = value
        .as_str()
        .is_some_and(|raw| field.options.iter().any(|option| option == raw));
    if !is_member {
        errors.push(format!(
            "Invalid choice for '{}': {}. Options: {:?}",
            field.name,
            display_value(value),
            field.options
        ));
    }
}

fn validate_multichoice(field: &PlaceholderField, value: &Value, errors: &mut Vec<String>) {
    match value.as_array() {
        Some(items) => {
            let invalid: Vec<String> = items
                .iter()
                .filter(|item| {
                    !item
                        .as_str()
                        .is_some_and(|raw| field.options.iter().any(|option| option == raw))
                })
                .map(display_value)
                .collect();
            if !invalid.is_empty() {
                errors.push(format!(
                    "Invalid choices for '{}': {:?}. Options: {:?}",
                    field.name, invalid, field.options
                ));
            }
        }
        None => {
            errors.push(format!("Multichoice field '{}' must be a list", field.name));
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}
