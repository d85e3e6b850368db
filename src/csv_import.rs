//! CSV prompt ingestion with flexible column-name mapping.
//! The core is consulted only to discover whether imported content carries
//! placeholders.

use std::path::Path;

use chrono::Utc;
use log::warn;

use crate::error::Result;
use crate::schema;
use crate::storage::{PromptRecord, Store};
use crate::template::MiniJinjaRenderer;

/// Column names accepted for the prompt name, in priority order.
const NAME_COLUMNS: [&str; 4] = ["name", "title", "act", "role"];

/// Column names accepted for the prompt content, in priority order.
const CONTENT_COLUMNS: [&str; 4] = ["content", "prompt", "description", "text"];

/// Column names accepted for a JSON placeholder schema.
const SCHEMA_COLUMNS: [&str; 3] = ["placeholders_schema", "schema", "placeholders"];

/// Counters for one import run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// One CSV row mapped into prompt shape.
#[derive(Debug)]
struct CsvPrompt {
    name: String,
    content: String,
    category: Option<String>,
    tags: Vec<String>,
    description: Option<String>,
    schema_json: Option<String>,
}

enum ImportOutcome {
    Created,
    Updated,
    Skipped,
}

/// Imports prompts from a comma-delimited CSV file.
///
/// Rows without a recognizable name or content column are skipped; a row
/// that fails to import increments `errors` without aborting the run. When a
/// row carries no schema and its content has placeholders, an auto-detected
/// schema is attached.
pub fn import_prompts(
    store: &mut Store,
    engine: &MiniJinjaRenderer,
    path: &Path,
    update_existing: bool,
) -> Result<ImportStats> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut stats = ImportStats::default();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!("Skipping malformed CSV row: {}", err);
                stats.errors += 1;
                continue;
            }
        };

        let Some(row) = map_row(&headers, &record) else {
            stats.skipped += 1;
            continue;
        };

        match import_single(store, engine, row, update_existing) {
            Ok(ImportOutcome::Created) => stats.created += 1,
            Ok(ImportOutcome::Updated) => stats.updated += 1,
            Ok(ImportOutcome::Skipped) => stats.skipped += 1,
            Err(err) => {
                warn!("Failed to import row: {}", err);
                stats.errors += 1;
            }
        }
    }

    store.save()?;
    Ok(stats)
}

/// Maps a CSV row to prompt shape. Returns `None` when no name or content
/// column can be found.
fn map_row(headers: &csv::StringRecord, record: &csv::StringRecord) -> Option<CsvPrompt> {
    let column = |candidates: &[&str]| -> Option<(String, String)> {
        for candidate in candidates {
            for (index, header) in headers.iter().enumerate() {
                if header.to_lowercase() == *candidate {
                    let value = record.get(index).unwrap_or_default().trim();
                    if !value.is_empty() {
                        return Some((header.to_lowercase(), value.to_string()));
                    }
                }
            }
        }
        None
    };

    let (_, name) = column(&NAME_COLUMNS)?;
    let (content_column, content) = column(&CONTENT_COLUMNS)?;

    let category = column(&["category"]).map(|(_, value)| value);
    let tags = column(&["tags", "tag"])
        .map(|(_, value)| {
            value
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    // A description column already claimed as content is not reused.
    let description = column(&["description", "desc"])
        .filter(|(header, _)| *header != content_column)
        .map(|(_, value)| value);

    // Schema columns carrying invalid JSON are ignored.
    let schema_json = column(&SCHEMA_COLUMNS)
        .map(|(_, value)| value)
        .filter(|raw| schema::schema_from_json(Some(raw)).is_some());

    Some(CsvPrompt { name, content, category, tags, description, schema_json })
}

fn import_single(
    store: &mut Store,
    engine: &MiniJinjaRenderer,
    row: CsvPrompt,
    update_existing: bool,
) -> Result<ImportOutcome> {
    if let Some(existing) = store.find_by_name(&row.name).cloned() {
        if !update_existing {
            return Ok(ImportOutcome::Skipped);
        }
        let mut updated = existing;
        updated.content = row.content;
        updated.description = row.description;
        updated.category = row.category;
        updated.tags = row.tags;
        updated.updated_at = Utc::now();
        attach_schema(&mut updated, row.schema_json.as_deref(), engine)?;
        store.update_prompt(updated)?;
        return Ok(ImportOutcome::Updated);
    }

    let mut record = PromptRecord::new(row.name, row.content);
    record.description = row.description;
    record.category = row.category;
    record.tags = row.tags;
    attach_schema(&mut record, row.schema_json.as_deref(), engine)?;
    store.create_prompt(record)?;
    Ok(ImportOutcome::Created)
}

/// Stores the row's schema, or auto-detects one when the content has
/// placeholders.
fn attach_schema(
    record: &mut PromptRecord,
    schema_json: Option<&str>,
    engine: &MiniJinjaRenderer,
) -> Result<()> {
    if let Some(fields) = schema::schema_from_json(schema_json) {
        return record.set_schema(&fields);
    }
    let placeholders = engine.extract_placeholders(&record.content);
    if placeholders.is_empty() {
        return Ok(());
    }
    record.set_schema(&schema::auto_schema(&placeholders))
}
