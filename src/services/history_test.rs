use super::*;
use serde_json::json;

fn temp_store() -> (HistoryStore, PathBuf) {
    let path = std::env::temp_dir().join(format!("aidash-history-{}.jsonl", uuid::Uuid::new_v4()));
    (HistoryStore::open(path.clone()).unwrap(), path)
}

#[test]
fn append_and_read_back_in_order() {
    let (store, path) = temp_store();

    store.append("s1", "user", "show products", Vec::new(), json!({})).unwrap();
    store.append("s1", "assistant", "Showing: Products", Vec::new(), json!({})).unwrap();
    store.append("s2", "user", "other session", Vec::new(), json!({})).unwrap();

    let records = store.get_session("s1");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].role, "user");
    assert_eq!(records[1].content, "Showing: Products");
    assert!(!records[0].ts.is_empty());

    let _ = std::fs::remove_file(path);
}

#[test]
fn cold_start_scans_file_lazily() {
    let (store, path) = temp_store();
    store.append("s1", "user", "hello", Vec::new(), json!({})).unwrap();
    drop(store);

    let reopened = HistoryStore::open(path.clone()).unwrap();
    let records = reopened.get_session("s1");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "hello");

    let _ = std::fs::remove_file(path);
}

#[test]
fn append_after_cold_start_does_not_duplicate() {
    let (store, path) = temp_store();
    store.append("s1", "user", "one", Vec::new(), json!({})).unwrap();
    drop(store);

    let reopened = HistoryStore::open(path.clone()).unwrap();
    reopened.append("s1", "user", "two", Vec::new(), json!({})).unwrap();
    let records = reopened.get_session("s1");
    assert_eq!(records.len(), 2);

    let _ = std::fs::remove_file(path);
}

#[test]
fn malformed_lines_are_skipped() {
    let (store, path) = temp_store();
    store.append("s1", "user", "good", Vec::new(), json!({})).unwrap();
    {
        use std::io::Write;
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json at all").unwrap();
    }
    store.append("s1", "user", "also good", Vec::new(), json!({})).unwrap();
    drop(store);

    let reopened = HistoryStore::open(path.clone()).unwrap();
    assert_eq!(reopened.get_session("s1").len(), 2);

    let _ = std::fs::remove_file(path);
}

#[test]
fn last_view_returns_newest_snapshot() {
    let (store, path) = temp_store();
    assert!(store.last_view("s1").is_none());

    store
        .append(
            "s1",
            "view",
            "layout",
            Vec::new(),
            json!({"layout": {"type": "Text", "content": "old"}, "datasets": {"data": []}}),
        )
        .unwrap();
    store
        .append(
            "s1",
            "view",
            "layout",
            Vec::new(),
            json!({"layout": {"type": "Page", "title": "Products"}, "datasets": {"products": [{"sku": "A"}]}}),
        )
        .unwrap();
    store.append("s1", "assistant", "done", Vec::new(), json!({})).unwrap();

    let (layout, datasets) = store.last_view("s1").unwrap();
    assert_eq!(layout["title"], json!("Products"));
    assert_eq!(datasets["products"][0]["sku"], json!("A"));

    let _ = std::fs::remove_file(path);
}
