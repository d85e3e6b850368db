//! User input and interaction handling.
//! Collects a placeholder value mapping from terminal prompts, one question
//! per schema field, or from a preloaded JSON object on stdin.

use std::io::Read;

use dialoguer::{Confirm, Input, MultiSelect, Select};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::schema::{FieldKind, PlaceholderField};

/// Prompts for a value for every schema field, in schema order.
///
/// Field defaults pre-fill the prompts. An unrecognized kind falls back to
/// plain text input.
pub fn collect_values(schema: &[PlaceholderField]) -> Result<Map<String, Value>> {
    let mut values = Map::new();

    for field in schema {
        let label = if field.description.is_empty() {
            field.name.clone()
        } else {
            field.description.clone()
        };

        let value = match field.field_kind() {
            Some(FieldKind::Bool) => prompt_bool(&label, field)?,
            Some(FieldKind::Choice) => prompt_choice(&label, field)?,
            Some(FieldKind::MultiChoice) => prompt_multichoice(&label, field)?,
            Some(FieldKind::Int) => prompt_int(&label, field)?,
            Some(FieldKind::Float) => prompt_float(&label, field)?,
            _ => prompt_text(&label, field)?,
        };
        values.insert(field.name.clone(), value);
    }

    Ok(values)
}

/// Reads a preloaded JSON value mapping from stdin.
///
/// Anything that is not a JSON object yields an empty mapping.
pub fn values_from_stdin() -> Result<Map<String, Value>> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    let parsed = serde_json::from_str(buffer.trim()).unwrap_or(Value::Null);
    Ok(match parsed {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

fn prompt_text(label: &str, field: &PlaceholderField) -> Result<Value> {
    let default_value = field
        .default
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let input: String = Input::new()
        .with_prompt(label)
        .default(default_value)
        .interact_text()
        .map_err(|e| Error::ConfigError(e.to_string()))?;

    Ok(Value::String(input))
}

fn prompt_int(label: &str, field: &PlaceholderField) -> Result<Value> {
    let default_value = field.default.as_ref().and_then(Value::as_i64).unwrap_or(0);

    let input: i64 = Input::new()
        .with_prompt(label)
        .default(default_value)
        .interact_text()
        .map_err(|e| Error::ConfigError(e.to_string()))?;

    Ok(json!(input))
}

fn prompt_float(label: &str, field: &PlaceholderField) -> Result<Value> {
    let default_value = field.default.as_ref().and_then(Value::as_f64).unwrap_or(0.0);

    let input: f64 = Input::new()
        .with_prompt(label)
        .default(default_value)
        .interact_text()
        .map_err(|e| Error::ConfigError(e.to_string()))?;

    Ok(json!(input))
}

fn prompt_bool(label: &str, field: &PlaceholderField) -> Result<Value> {
    let default_value = field.default.as_ref().and_then(Value::as_bool).unwrap_or(false);

    let result = Confirm::new()
        .with_prompt(label)
        .default(default_value)
        .interact()
        .map_err(|e| Error::ConfigError(e.to_string()))?;

    Ok(Value::Bool(result))
}

fn prompt_choice(label: &str, field: &PlaceholderField) -> Result<Value> {
    let default_index = field
        .default
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|default_str| field.options.iter().position(|option| option == default_str))
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt(label)
        .default(default_index)
        .items(&field.options)
        .interact()
        .map_err(|e| Error::ConfigError(e.to_string()))?;

    Ok(Value::String(field.options[selection].clone()))
}

fn prompt_multichoice(label: &str, field: &PlaceholderField) -> Result<Value> {
    let default_members: Vec<&str> = field
        .default
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let defaults: Vec<bool> = field
        .options
        .iter()
        .map(|option| default_members.contains(&option.as_str()))
        .collect();

    let selections = MultiSelect::new()
        .with_prompt(label)
        .items(&field.options)
        .defaults(&defaults)
        .interact()
        .map_err(|e| Error::ConfigError(e.to_string()))?;

    let chosen: Vec<Value> = selections
        .into_iter()
        .map(|index| Value::String(field.options[index].clone()))
        .collect();
    Ok(Value::Array(chosen))
}
