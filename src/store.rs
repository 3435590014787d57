use crate::config::JournalConfig;
use crate::models::{generate_id, BookFormat, BookRecord};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record store json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable list of book records keyed by id.
pub trait RecordStore {
    fn load_all(&self) -> Result<Vec<BookRecord>, StoreError>;

    /// Writes the whole record. Assigns an id when the record has none and
    /// returns the id it was stored under.
    fn upsert(&self, record: &BookRecord) -> Result<String, StoreError>;

    /// Returns whether a record with that id existed.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// All records in one pretty-printed JSON array, rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        Self::new(config.data_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw entries as stored. A missing file, corrupt JSON or a non-array
    /// document all read as an empty collection; only real IO failures error.
    fn read_entries(&self) -> Result<Vec<Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => {
                log::warn!(
                    "record store {} does not hold an array, treating as empty",
                    self.path.display()
                );
                Ok(Vec::new())
            }
            Err(err) => {
                log::warn!(
                    "record store {} is not valid json ({}), treating as empty",
                    self.path.display(),
                    err
                );
                Ok(Vec::new())
            }
        }
    }

    fn write_entries(&self, entries: &[Value]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<BookRecord>, StoreError> {
        let entries = self.read_entries()?;
        let mut records = Vec::with_capacity(entries.len());
        for (index, mut entry) in entries.into_iter().enumerate() {
            normalize_legacy_entry(&mut entry);
            match serde_json::from_value::<BookRecord>(entry) {
                Ok(record) => records.push(record),
                Err(err) => log::warn!("skipping unreadable book entry #{}: {}", index, err),
            }
        }
        Ok(records)
    }

    fn upsert(&self, record: &BookRecord) -> Result<String, StoreError> {
        let mut entries = self.read_entries()?;
        let id = match record.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate_id(),
        };

        let mut value = serde_json::to_value(record)?;
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), Value::String(id.clone()));
        }

        match entries
            .iter()
            .position(|entry| entry_id(entry) == Some(id.as_str()))
        {
            Some(index) => entries[index] = value,
            None => entries.push(value),
        }
        self.write_entries(&entries)?;
        log::info!("saved book {} ({} in journal)", id, entries.len());
        Ok(id)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.read_entries()?;
        let before = entries.len();
        entries.retain(|entry| entry_id(entry) != Some(id));
        if entries.len() == before {
            return Ok(false);
        }
        self.write_entries(&entries)?;
        log::info!("deleted book {}", id);
        Ok(true)
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

/// Brings entries written by older versions into the current shape:
/// `formats` (a flag map or a plain string) becomes `format`, and a
/// `description` without a `summary` becomes the summary.
fn normalize_legacy_entry(entry: &mut Value) {
    let Some(map) = entry.as_object_mut() else {
        return;
    };

    if let Some(legacy) = map.remove("formats") {
        if !has_text(map, "format") {
            let format = match legacy {
                Value::String(raw) => BookFormat::parse(&raw),
                Value::Object(flags) => BookFormat::ALL.into_iter().find(|format| {
                    flags
                        .get(format.as_str())
                        .and_then(Value::as_bool)
                        .unwrap_or(false)
                }),
                _ => None,
            };
            let format = format.map(|format| format.as_str()).unwrap_or("");
            map.insert("format".to_string(), Value::String(format.to_string()));
        }
    }

    if !has_text(map, "summary") {
        if let Some(Value::String(description)) = map.get("description").cloned() {
            map.insert("summary".to_string(), Value::String(description));
        }
    }
}

fn has_text(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key)
        .and_then(Value::as_str)
        .is_some_and(|value| !value.trim().is_empty())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Sticker};
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("journal").join("BookJournalData.json"))
    }

    fn record(title: &str) -> BookRecord {
        let mut record = BookRecord::new(Category::Novels);
        record.content.title = title.to_string();
        record
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(store_in(&dir).load_all().expect("load").is_empty());
    }

    #[test]
    fn corrupt_or_non_array_file_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("data.json"));

        fs::write(store.path(), "{ not json").expect("write");
        assert!(store.load_all().expect("load").is_empty());

        fs::write(store.path(), r#"{"title": "not a list"}"#).expect("write");
        assert!(store.load_all().expect("load").is_empty());
    }

    #[test]
    fn upsert_assigns_id_then_overwrites_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let id = store.upsert(&record("Dune")).expect("insert");
        assert!(!id.is_empty());
        store.upsert(&record("Emma")).expect("second insert");

        let mut updated = record("Dune Messiah");
        updated.id = Some(id.clone());
        assert_eq!(store.upsert(&updated).expect("update"), id);

        let records = store.load_all().expect("load");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(records[0].content.title, "Dune Messiah");
        assert_eq!(records[1].content.title, "Emma");
    }

    #[test]
    fn upsert_with_unknown_id_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut imported = record("Persuasion");
        imported.id = Some("imported-1".to_string());

        assert_eq!(store.upsert(&imported).expect("upsert"), "imported-1");
        assert_eq!(store.load_all().expect("load").len(), 1);
    }

    #[test]
    fn round_trips_stickers_and_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut book = record("Dune");
        book.content.summary_height = Some(220.0);
        book.content.stickers.push(Sticker {
            id: "s-1".to_string(),
            url: "data:image/png;base64,AAAA".to_string(),
            x: 12.0,
            y: 0.0,
            width: 160.0,
            height: 212.8,
            angle: -45,
            z: 1004,
        });

        let id = store.upsert(&book).expect("upsert");
        book.id = Some(id);
        assert_eq!(store.load_all().expect("load"), vec![book]);
    }

    #[test]
    fn legacy_entries_are_normalized_and_other_fields_survive_rewrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("data.json"));
        let legacy = json!([
            {
                "id": "old-1",
                "title": "Old Shape",
                "description": "from the first release",
                "coverName": "cover.jpg",
                "formats": { "hardcover": false, "ebook": true }
            },
            { "id": "old-2", "title": "Stringy", "formats": "audiobook" },
            "not a record"
        ]);
        fs::write(store.path(), legacy.to_string()).expect("write");

        let records = store.load_all().expect("load");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content.format, Some(BookFormat::Ebook));
        assert_eq!(records[0].content.summary, "from the first release");
        assert_eq!(records[1].content.format, Some(BookFormat::Audiobook));

        store.upsert(&record("New")).expect("upsert");
        let raw: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).expect("read")).expect("json");
        assert_eq!(raw[0]["coverName"], "cover.jpg");
        assert_eq!(raw.as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn delete_removes_only_matching_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let keep = store.upsert(&record("Keep")).expect("insert");
        let drop = store.upsert(&record("Drop")).expect("insert");

        assert!(store.delete(&drop).expect("delete"));
        assert!(!store.delete("missing").expect("delete missing"));

        let records = store.load_all().expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some(keep.as_str()));
    }
}
