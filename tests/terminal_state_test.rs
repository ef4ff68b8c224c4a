//! Tests for the terminal document and the persisted state store

use std::fs;

use prompt_enhancer::interactive::{
    Document, JsonFileStore, KeyValueStore, TerminalWorkbench, Workbench, WELCOME_KEY,
};
use serde_json::{json, Value};
use tempfile::TempDir;

// ============================================================================
// JsonFileStore
// ============================================================================

#[test]
fn test_store_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("state.json")).unwrap();
    assert!(store.get(WELCOME_KEY).is_none());
    assert!(!store.get_bool(WELCOME_KEY, false));
}

#[test]
fn test_store_persists_across_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let mut store = JsonFileStore::open(&path).unwrap();
    store.set(WELCOME_KEY, Value::Bool(true)).unwrap();
    assert!(path.exists());

    let reopened = JsonFileStore::open(&path).unwrap();
    assert!(reopened.get_bool(WELCOME_KEY, false));
    assert_eq!(reopened.path(), path.as_path());
}

#[test]
fn test_store_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

    let mut store = JsonFileStore::open(&path).unwrap();
    store.set(WELCOME_KEY, Value::Bool(true)).unwrap();

    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved, json!({ "theme": "dark", "hasShownWelcome": true }));
}

#[test]
fn test_store_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "{not json").unwrap();

    let err = JsonFileStore::open(&path).unwrap_err();
    assert!(err.to_string().contains("state.json"));
}

// ============================================================================
// Document
// ============================================================================

#[test]
fn test_document_selection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt.md");
    fs::write(&path, "# Ideas\nmake a todo app\nwith login\n").unwrap();

    let doc = Document::open(&path, Some((2, 3))).unwrap();
    assert_eq!(doc.selected_text(), Some("make a todo app\nwith login"));

    let doc = Document::open(&path, None).unwrap();
    assert_eq!(doc.selected_text(), None);
}

#[test]
fn test_document_out_of_range_selection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt.md");
    fs::write(&path, "one line\n").unwrap();

    assert!(Document::open(&path, Some((2, 4))).is_err());
}

#[test]
fn test_document_replace_selection_saves() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt.md");
    fs::write(&path, "# Ideas\nmake a todo app\n---\n").unwrap();

    let mut doc = Document::open(&path, Some((2, 2))).unwrap();
    doc.replace_selection("Create a todo application").unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# Ideas\nCreate a todo application\n---\n"
    );
    assert_eq!(doc.selected_text(), Some("Create a todo application"));
}

#[test]
fn test_document_insert_at_end_without_selection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt.md");
    fs::write(&path, "notes:\n").unwrap();

    let mut doc = Document::open(&path, None).unwrap();
    assert!(doc.replace_selection("x").is_err());
    doc.insert_at_cursor("Enhanced").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "notes:\nEnhanced");
}

// ============================================================================
// TerminalWorkbench
// ============================================================================

#[test]
fn test_workbench_reports_document_selection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt.md");
    fs::write(&path, "make a todo app\n").unwrap();

    let wb = TerminalWorkbench::new(Some(Document::open(&path, Some((1, 1))).unwrap()));
    assert!(wb.has_active_editor());
    assert_eq!(wb.selected_text().as_deref(), Some("make a todo app"));

    let empty = TerminalWorkbench::new(None);
    assert!(!empty.has_active_editor());
    assert!(empty.selected_text().is_none());
}

#[test]
fn test_workbench_replace_writes_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt.md");
    fs::write(&path, "make a todo app\n").unwrap();

    let mut wb = TerminalWorkbench::new(Some(Document::open(&path, Some((1, 1))).unwrap()));
    wb.replace_selection("Enhanced").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "Enhanced\n");
    assert_eq!(wb.document().unwrap().text(), "Enhanced\n");
}

#[test]
fn test_workbench_without_document_cannot_edit() {
    let mut wb = TerminalWorkbench::new(None);
    assert!(wb.replace_selection("x").is_err());
    assert!(wb.insert_at_cursor("x").is_err());
}
