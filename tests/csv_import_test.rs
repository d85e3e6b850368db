use std::path::PathBuf;

use promptforge::csv_import::{import_prompts, ImportStats};
use promptforge::storage::Store;
use promptforge::template::MiniJinjaRenderer;
use tempfile::TempDir;

fn write_csv(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("prompts.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn open_store(dir: &TempDir) -> Store {
    Store::open(dir.path().join("store.json")).unwrap()
}

#[test]
fn test_import_with_flexible_column_names() {
    let temp_dir = TempDir::new().unwrap();
    // "act"/"prompt" is the Awesome-ChatGPT-Prompts column layout.
    let csv = write_csv(
        &temp_dir,
        "act,prompt\nLinux Terminal,I want you to act as a linux terminal\n",
    );
    let mut store = open_store(&temp_dir);
    let engine = MiniJinjaRenderer::new();

    let stats = import_prompts(&mut store, &engine, &csv, false).unwrap();
    assert_eq!(stats, ImportStats { created: 1, updated: 0, skipped: 0, errors: 0 });

    let record = store.find_by_name("Linux Terminal").unwrap();
    assert!(record.content.starts_with("I want you"));
    assert!(record.placeholders_schema.is_none());
}

#[test]
fn test_rows_without_name_or_content_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(&temp_dir, "name,content\nhas-both,text\n,orphan content\nno-content,\n");
    let mut store = open_store(&temp_dir);
    let engine = MiniJinjaRenderer::new();

    let stats = import_prompts(&mut store, &engine, &csv, false).unwrap();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.skipped, 2);
}

#[test]
fn test_existing_prompts_are_skipped_unless_updating() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(&temp_dir, "name,content\ngreeting,first version\n");
    let mut store = open_store(&temp_dir);
    let engine = MiniJinjaRenderer::new();

    import_prompts(&mut store, &engine, &csv, false).unwrap();

    let csv = write_csv(&temp_dir, "name,content\ngreeting,second version\n");
    let stats = import_prompts(&mut store, &engine, &csv, false).unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(store.find_by_name("greeting").unwrap().content, "first version");

    let stats = import_prompts(&mut store, &engine, &csv, true).unwrap();
    assert_eq!(stats.updated, 1);
    assert_eq!(store.find_by_name("greeting").unwrap().content, "second version");
}

#[test]
fn test_placeholder_content_gets_auto_schema() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(
        &temp_dir,
        "name,content\ntranslate,\"Translate {{ text }} into {{ language }}\"\n",
    );
    let mut store = open_store(&temp_dir);
    let engine = MiniJinjaRenderer::new();

    import_prompts(&mut store, &engine, &csv, false).unwrap();

    let record = store.find_by_name("translate").unwrap();
    let schema = record.schema().expect("auto schema should be attached");
    let names: Vec<&str> = schema.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, vec!["language", "text"]);
}

#[test]
fn test_explicit_schema_column_wins_over_auto_detection() {
    let temp_dir = TempDir::new().unwrap();
    let schema_json = r#"[{""name"": ""text"", ""type"": ""text"", ""required"": true}]"#;
    let csv = write_csv(
        &temp_dir,
        &format!("name,content,schema\nsummarize,\"Summarize {{{{ text }}}}\",\"{}\"\n", schema_json),
    );
    let mut store = open_store(&temp_dir);
    let engine = MiniJinjaRenderer::new();

    let stats = import_prompts(&mut store, &engine, &csv, false).unwrap();
    assert_eq!(stats.created, 1);

    let schema = store.find_by_name("summarize").unwrap().schema().unwrap();
    assert_eq!(schema.len(), 1);
    assert_eq!(schema[0].kind, "text");
}

#[test]
fn test_tags_and_category_are_mapped() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(
        &temp_dir,
        "title,text,category,tags\nreviewer,Review this diff,code,\"rust, review ,\"\n",
    );
    let mut store = open_store(&temp_dir);
    let engine = MiniJinjaRenderer::new();

    import_prompts(&mut store, &engine, &csv, false).unwrap();

    let record = store.find_by_name("reviewer").unwrap();
    assert_eq!(record.category.as_deref(), Some("code"));
    assert_eq!(record.tags, vec!["rust", "review"]);
}

#[test]
fn test_import_persists_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(&temp_dir, "name,content\npersisted,body\n");
    let store_path = temp_dir.path().join("store.json");
    let mut store = Store::open(&store_path).unwrap();
    let engine = MiniJinjaRenderer::new();

    import_prompts(&mut store, &engine, &csv, false).unwrap();

    let reopened = Store::open(&store_path).unwrap();
    assert!(reopened.find_by_name("persisted").is_some());
}
