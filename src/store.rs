use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use chrono::Local;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;
use crate::error::{AppError, Result};

pub const CONTENT_FILE: &str = "content.json";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DEFAULT_STATUS: &str = "Pending";

/// One stored form entry. Arbitrary fields from the submitted body plus the
/// injected `timestamp` and (for submissions) `status`.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormCategory {
    Contact,
    Admission,
    Registration,
}

impl FormCategory {
    /// Maps a `form_type` request field to a category. Unknown values fall
    /// back to `Contact`.
    pub fn from_form_type(form_type: &str) -> Self {
        match form_type {
            "admission" => FormCategory::Admission,
            "registration" => FormCategory::Registration,
            _ => FormCategory::Contact,
        }
    }

    /// Maps an export path segment to a category.
    pub fn from_export_name(name: &str) -> Option<Self> {
        match name {
            "contact" => Some(FormCategory::Contact),
            "admissions" => Some(FormCategory::Admission),
            "registrations" => Some(FormCategory::Registration),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            FormCategory::Contact => "submissions.json",
            FormCategory::Admission => "admissions.json",
            FormCategory::Registration => "registrations.json",
        }
    }

    // Event registrations have no review workflow.
    fn tracks_status(self) -> bool {
        !matches!(self, FormCategory::Registration)
    }

    fn lock_index(self) -> usize {
        match self {
            FormCategory::Contact => 0,
            FormCategory::Admission => 1,
            FormCategory::Registration => 2,
        }
    }
}

/// File-backed record store: one JSON array file per category, rewritten in
/// full on every mutation.
///
/// Each category has its own mutex held for the whole read-mutate-write
/// cycle, so two requests against the same file cannot interleave and lose
/// updates. Records are addressed by array position; every positional
/// mutation is bounds-checked and leaves the file untouched on a stale
/// index.
pub struct RecordStore {
    dir: PathBuf,
    locks: [Mutex<()>; 3],
    content_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            locks: [Mutex::new(()), Mutex::new(()), Mutex::new(())],
            content_lock: Mutex::new(()),
        }
    }

    fn path(&self, category: FormCategory) -> PathBuf {
        self.dir.join(category.file_name())
    }

    fn lock(&self, category: FormCategory) -> &Mutex<()> {
        &self.locks[category.lock_index()]
    }

    async fn read_records(&self, path: &Path) -> Result<Vec<Record>> {
        match fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                AppError::Store(format!("corrupt record file {}: {e}", path.display()))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(AppError::Store(format!(
                "cannot read {}: {err}",
                path.display()
            ))),
        }
    }

    async fn write_records(&self, path: &Path, records: &[Record]) -> Result<()> {
        let pretty = serde_json::to_string_pretty(records)
            .map_err(|e| AppError::Store(format!("cannot serialize records: {e}")))?;
        fs::write(path, pretty)
            .await
            .map_err(|e| AppError::Store(format!("cannot write {}: {e}", path.display())))
    }

    /// Appends a record, injecting `timestamp` and, for categories with a
    /// review workflow, `status = "Pending"`.
    pub async fn append(&self, category: FormCategory, mut record: Record) -> Result<()> {
        record.insert(
            "timestamp".to_string(),
            Value::String(Local::now().format(TIMESTAMP_FORMAT).to_string()),
        );
        if category.tracks_status() {
            record.insert("status".to_string(), Value::String(DEFAULT_STATUS.to_string()));
        }

        let _guard = self.lock(category).lock().await;
        let path = self.path(category);
        let mut records = self.read_records(&path).await?;
        records.push(record);
        self.write_records(&path, &records).await
    }

    /// Returns the full category contents, empty if the file does not exist.
    pub async fn list(&self, category: FormCategory) -> Result<Vec<Record>> {
        let _guard = self.lock(category).lock().await;
        self.read_records(&self.path(category)).await
    }

    pub async fn update_status(
        &self,
        category: FormCategory,
        index: usize,
        status: &str,
    ) -> Result<()> {
        let _guard = self.lock(category).lock().await;
        let path = self.path(category);
        let mut records = self.read_records(&path).await?;
        let len = records.len();
        let record = records
            .get_mut(index)
            .ok_or(AppError::IndexOutOfRange { index, len })?;
        record.insert("status".to_string(), Value::String(status.to_string()));
        self.write_records(&path, &records).await
    }

    pub async fn delete(&self, category: FormCategory, index: usize) -> Result<()> {
        let _guard = self.lock(category).lock().await;
        let path = self.path(category);
        let mut records = self.read_records(&path).await?;
        if index >= records.len() {
            return Err(AppError::IndexOutOfRange {
                index,
                len: records.len(),
            });
        }
        records.remove(index);
        self.write_records(&path, &records).await
    }

    /// Renders a category as CSV: UTF-8 with BOM, header = sorted union of
    /// all record keys. `None` when the category has no data.
    pub async fn export_csv(&self, category: FormCategory) -> Result<Option<Vec<u8>>> {
        let records = self.list(category).await?;
        if records.is_empty() {
            return Ok(None);
        }
        records_to_csv(&records).map(Some)
    }

    /// Opaque admin-editable content blob.
    pub async fn read_content(&self) -> Result<Option<Value>> {
        let _guard = self.content_lock.lock().await;
        let path = self.dir.join(CONTENT_FILE);
        match fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| AppError::Store(format!("corrupt {}: {e}", path.display()))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::Store(format!(
                "cannot read {}: {err}",
                path.display()
            ))),
        }
    }

    pub async fn write_content(&self, value: &Value) -> Result<()> {
        let _guard = self.content_lock.lock().await;
        let path = self.dir.join(CONTENT_FILE);
        let pretty = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::Store(format!("cannot serialize content: {e}")))?;
        fs::write(&path, pretty)
            .await
            .map_err(|e| AppError::Store(format!("cannot write {}: {e}", path.display())))
    }
}

fn records_to_csv(records: &[Record]) -> Result<Vec<u8>> {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        keys.extend(record.keys().map(String::as_str));
    }

    // BOM first so spreadsheet tools pick up the encoding.
    let mut buf = Vec::new();
    buf.extend_from_slice("\u{feff}".as_bytes());

    let mut writer = csv::Writer::from_writer(buf);
    writer
        .write_record(keys.iter())
        .map_err(|e| AppError::Store(format!("csv write failed: {e}")))?;
    for record in records {
        let row = keys.iter().map(|key| match record.get(*key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer
            .write_record(row)
            .map_err(|e| AppError::Store(format!("csv write failed: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Store(format!("csv flush failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(fields: Value) -> Record {
        fields.as_object().unwrap().clone()
    }

    fn store() -> (RecordStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (RecordStore::new(dir.path().to_path_buf()), dir)
    }

    #[tokio::test]
    async fn append_then_list_injects_status_and_timestamp() {
        let (store, _dir) = store();
        store
            .append(FormCategory::Contact, record(json!({ "name": "A" })))
            .await
            .unwrap();

        let records = store.list(FormCategory::Contact).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "A");
        assert_eq!(records[0]["status"], "Pending");
        assert!(!records[0]["timestamp"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registrations_carry_no_status() {
        let (store, _dir) = store();
        store
            .append(FormCategory::Registration, record(json!({ "name": "B" })))
            .await
            .unwrap();

        let records = store.list(FormCategory::Registration).await.unwrap();
        assert!(records[0].get("status").is_none());
        assert!(records[0].get("timestamp").is_some());
    }

    #[tokio::test]
    async fn list_of_absent_file_is_empty() {
        let (store, _dir) = store();
        assert!(store.list(FormCategory::Admission).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_status_mutates_only_the_indexed_record() {
        let (store, _dir) = store();
        store
            .append(FormCategory::Contact, record(json!({ "name": "A" })))
            .await
            .unwrap();
        store
            .append(FormCategory::Contact, record(json!({ "name": "B" })))
            .await
            .unwrap();

        store
            .update_status(FormCategory::Contact, 1, "Resolved")
            .await
            .unwrap();

        let records = store.list(FormCategory::Contact).await.unwrap();
        assert_eq!(records[0]["status"], "Pending");
        assert_eq!(records[1]["status"], "Resolved");
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_record() {
        let (store, _dir) = store();
        for name in ["A", "B", "C"] {
            store
                .append(FormCategory::Contact, record(json!({ "name": name })))
                .await
                .unwrap();
        }

        store.delete(FormCategory::Contact, 1).await.unwrap();

        let records = store.list(FormCategory::Contact).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "A");
        assert_eq!(records[1]["name"], "C");
    }

    #[tokio::test]
    async fn out_of_range_mutations_fail_and_leave_the_file_unchanged() {
        let (store, _dir) = store();
        store
            .append(FormCategory::Contact, record(json!({ "name": "A" })))
            .await
            .unwrap();
        let before = store.list(FormCategory::Contact).await.unwrap();

        let err = store
            .update_status(FormCategory::Contact, 5, "Resolved")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfRange { index: 5, len: 1 }));

        let err = store.delete(FormCategory::Contact, 1).await.unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfRange { index: 1, len: 1 }));

        assert_eq!(store.list(FormCategory::Contact).await.unwrap(), before);
    }

    #[tokio::test]
    async fn export_header_is_the_sorted_key_union() {
        let (store, _dir) = store();
        store
            .append(FormCategory::Admission, record(json!({ "name": "A" })))
            .await
            .unwrap();

        let bytes = store
            .export_csv(FormCategory::Admission)
            .await
            .unwrap()
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with('\u{feff}'));

        let mut lines = text.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next().unwrap(), "name,status,timestamp");
        assert_eq!(lines.count(), 1);
    }

    #[tokio::test]
    async fn export_of_empty_category_is_none() {
        let (store, _dir) = store();
        assert!(store
            .export_csv(FormCategory::Registration)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn persisted_json_keeps_non_ascii_unescaped() {
        let (store, dir) = store();
        store
            .append(FormCategory::Contact, record(json!({ "name": "ಕನ್ನಡ" })))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("submissions.json")).unwrap();
        assert!(raw.contains("ಕನ್ನಡ"));
        assert!(!raw.contains("\\u"));
    }

    #[tokio::test]
    async fn content_roundtrip_and_absence() {
        let (store, _dir) = store();
        assert!(store.read_content().await.unwrap().is_none());

        let blob = json!({ "hero": { "title": "Welcome" } });
        store.write_content(&blob).await.unwrap();
        assert_eq!(store.read_content().await.unwrap(), Some(blob));
    }
}
