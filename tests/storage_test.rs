use promptforge::schema::{schema_from_json, PlaceholderField};
use promptforge::storage::{ExecutionStatus, HistoryEntry, PromptRecord, Store};
use tempfile::TempDir;

fn schema_of(raw: &str) -> Vec<PlaceholderField> {
    schema_from_json(Some(raw)).expect("schema json should parse")
}

#[test]
fn test_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("store.json");

    let mut store = Store::open(&store_path).unwrap();
    let mut record = PromptRecord::new("greeting", "Hello {{ name }}");
    record.category = Some("demo".to_string());
    record.tags = vec!["test".to_string()];
    let id = store.create_prompt(record).unwrap();
    store.save().unwrap();

    let reopened = Store::open(&store_path).unwrap();
    let stored = reopened.get_prompt(&id).expect("prompt should survive reopen");
    assert_eq!(stored.name, "greeting");
    assert_eq!(stored.category.as_deref(), Some("demo"));
}

#[test]
fn test_duplicate_names_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = Store::open(temp_dir.path().join("store.json")).unwrap();

    store.create_prompt(PromptRecord::new("dup", "a")).unwrap();
    let err = store.create_prompt(PromptRecord::new("dup", "b")).unwrap_err();
    assert!(err.to_string().contains("dup"));
}

#[test]
fn test_update_requires_existing_record() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = Store::open(temp_dir.path().join("store.json")).unwrap();

    let unknown = PromptRecord::new("ghost", "boo");
    assert!(store.update_prompt(unknown).is_err());

    store.create_prompt(PromptRecord::new("real", "v1")).unwrap();
    let mut updated = store.find_by_name("real").cloned().unwrap();
    updated.content = "v2".to_string();
    store.update_prompt(updated).unwrap();
    assert_eq!(store.find_by_name("real").unwrap().content, "v2");
}

#[test]
fn test_equality_queries() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = Store::open(temp_dir.path().join("store.json")).unwrap();

    let mut a = PromptRecord::new("a", "x");
    a.category = Some("code".to_string());
    a.tags = vec!["rust".to_string(), "cli".to_string()];
    a.is_favorite = true;
    store.create_prompt(a).unwrap();

    let mut b = PromptRecord::new("b", "y");
    b.category = Some("writing".to_string());
    b.tags = vec!["cli".to_string()];
    store.create_prompt(b).unwrap();

    assert_eq!(store.by_category("code").len(), 1);
    assert_eq!(store.by_tag("cli").len(), 2);
    assert_eq!(store.by_tag("rust").len(), 1);
    assert_eq!(store.favorites().len(), 1);
    assert!(store.by_category("missing").is_empty());
}

#[test]
fn test_schema_accessors() {
    let mut record = PromptRecord::new("p", "{{ x }}");
    assert!(record.schema().is_none());

    let fields = schema_of(r#"[{"name": "x", "type": "int", "required": true}]"#);
    record.set_schema(&fields).unwrap();
    assert_eq!(record.schema().unwrap(), fields);

    // Malformed stored JSON degrades to "no schema".
    record.placeholders_schema = Some("{broken".to_string());
    assert!(record.schema().is_none());

    record.set_schema(&[]).unwrap();
    assert!(record.placeholders_schema.is_none());
}

#[test]
fn test_history_is_recorded_per_prompt() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("store.json");
    let mut store = Store::open(&store_path).unwrap();

    let id = store.create_prompt(PromptRecord::new("p", "x")).unwrap();
    store.add_history(HistoryEntry::new(
        Some(id),
        "openai",
        "gpt-4o-mini",
        "{}",
        "fine",
        120,
        ExecutionStatus::Completed,
    ));
    store.add_history(HistoryEntry::new(
        None,
        "ollama",
        "llama3",
        "{}",
        "",
        5,
        ExecutionStatus::Stopped,
    ));
    store.save().unwrap();

    let reopened = Store::open(&store_path).unwrap();
    assert_eq!(reopened.history().len(), 2);
    let entries = reopened.history_for_prompt(&id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, ExecutionStatus::Completed);
}
