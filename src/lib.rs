//! PromptForge is a prompt template management system.
//! It provides a library of reusable prompt templates with typed placeholder
//! schemas, a restricted composition/rendering engine, and connectors for
//! sending rendered prompts to remote text-generation services.

/// LLM backend connectors and the backend registry
pub mod backend;

/// Command-line interface module for the PromptForge application
pub mod cli;

/// Prompt composition pipeline: extraction, validation, rendering
pub mod compose;

/// Application settings handling
/// Supports JSON and YAML formats (promptforge.json, promptforge.yml, promptforge.yaml)
pub mod config;

/// CSV prompt ingestion with flexible column mapping
pub mod csv_import;

/// Error types and handling for the PromptForge application
pub mod error;

/// User input and interaction handling
pub mod prompt;

/// Placeholder schema model: validation, reconciliation, defaults
pub mod schema;

/// Prompt and execution-history record store
pub mod storage;

/// Template parsing and rendering functionality
/// Handles the actual template processing logic
pub mod template;
