//! JSON-file-backed record store for prompts and execution history.
//! Create/read/update and equality queries only; anything fancier belongs
//! to an external database.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::schema::{self, PlaceholderField};

/// A stored prompt template with its metadata and declared schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptRecord {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Placeholder schema as a JSON-encoded field array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholders_schema: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromptRecord {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            description: None,
            category: None,
            tags: Vec::new(),
            placeholders_schema: None,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decodes the stored placeholder schema. Absent or malformed JSON means
    /// "no schema".
    pub fn schema(&self) -> Option<Vec<PlaceholderField>> {
        schema::schema_from_json(self.placeholders_schema.as_deref())
    }

    /// Encodes and stores a placeholder schema; an empty one clears it.
    pub fn set_schema(&mut self, fields: &[PlaceholderField]) -> Result<()> {
        self.placeholders_schema = if fields.is_empty() {
            None
        } else {
            Some(serde_json::to_string(fields)?)
        };
        Ok(())
    }
}

/// Terminal state of a recorded execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Completed,
    Stopped,
    Failed,
}

/// One prompt execution against a backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<Uuid>,
    pub backend: String,
    pub model: String,
    /// Request as sent, JSON-encoded
    pub request_payload: String,
    pub response_text: String,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        prompt_id: Option<Uuid>,
        backend: impl Into<String>,
        model: impl Into<String>,
        request_payload: impl Into<String>,
        response_text: impl Into<String>,
        duration_ms: u64,
        status: ExecutionStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_id,
            backend: backend.into(),
            model: model.into(),
            request_payload: request_payload.into(),
            response_text: response_text.into(),
            duration_ms,
            status,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    prompts: Vec<PromptRecord>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

/// The record store. All reads operate on the in-memory copy; [`Store::save`]
/// persists it.
pub struct Store {
    path: PathBuf,
    data: StoreData,
}

impl Store {
    /// Opens a store file, creating an empty store when the file is absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let content = fs::read_to_string(&path).map_err(Error::IoError)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::StorageError(format!("invalid store file {}: {}", path.display(), e))
            })?
        } else {
            debug!("Store file {} does not exist; starting empty", path.display());
            StoreData::default()
        };
        Ok(Self { path, data })
    }

    /// Persists the store to its backing file.
    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, content).map_err(Error::IoError)
    }

    /// Adds a prompt. Names are unique; a duplicate is an error.
    pub fn create_prompt(&mut self, record: PromptRecord) -> Result<Uuid> {
        if self.find_by_name(&record.name).is_some() {
            return Err(Error::StorageError(format!(
                "a prompt named '{}' already exists",
                record.name
            )));
        }
        let id = record.id;
        self.data.prompts.push(record);
        Ok(id)
    }

    /// Replaces a stored prompt, matched by id.
    pub fn update_prompt(&mut self, record: PromptRecord) -> Result<()> {
        match self.data.prompts.iter_mut().find(|prompt| prompt.id == record.id) {
            Some(stored) => {
                *stored = record;
                Ok(())
            }
            None => Err(Error::StorageError(format!("no stored prompt with id {}", record.id))),
        }
    }

    pub fn get_prompt(&self, id: &Uuid) -> Option<&PromptRecord> {
        self.data.prompts.iter().find(|prompt| prompt.id == *id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PromptRecord> {
        self.data.prompts.iter().find(|prompt| prompt.name == name)
    }

    pub fn prompts(&self) -> &[PromptRecord] {
        &self.data.prompts
    }

    pub fn by_category(&self, category: &str) -> Vec<&PromptRecord> {
        self.data
            .prompts
            .iter()
            .filter(|prompt| prompt.category.as_deref() == Some(category))
            .collect()
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&PromptRecord> {
        self.data
            .prompts
            .iter()
            .filter(|prompt| prompt.tags.iter().any(|t| t == tag))
            .collect()
    }

    pub fn favorites(&self) -> Vec<&PromptRecord> {
        self.data.prompts.iter().filter(|prompt| prompt.is_favorite).collect()
    }

    pub fn add_history(&mut self, entry: HistoryEntry) {
        self.data.history.push(entry);
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.data.history
    }

    pub fn history_for_prompt(&self, prompt_id: &Uuid) -> Vec<&HistoryEntry> {
        self.data
            .history
            .iter()
            .filter(|entry| entry.prompt_id.as_ref() == Some(prompt_id))
            .collect()
    }
}
