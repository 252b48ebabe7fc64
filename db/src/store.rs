//! Append-only result store.
//!
//! [`ResultStore`] keeps every [`TestResult`] in insertion order with an id
//! index for O(1) lookup. When opened on a path it is backed by a JSON-lines
//! log: existing records are replayed on open and each append writes one
//! line before the record becomes visible to readers.
//!
//! A final line without its newline is the trace of an append that never
//! finished. Open drops it with a warning instead of refusing the whole log.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use prompt_harness_core::{AnalysisKind, TestResult};
use tracing::{debug, info, warn};

use crate::error::{DatabaseError, Result};

#[derive(Debug, Default)]
struct Records {
    results: Vec<TestResult>,
    index: HashMap<String, usize>,
}

impl Records {
    fn push(&mut self, result: TestResult) {
        self.index.insert(result.test_id.clone(), self.results.len());
        self.results.push(result);
    }
}

#[derive(Debug)]
struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Writes one full line, or nothing: a failed write is cut back off.
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let before = self.file.metadata()?.len();
        if let Err(err) = self.file.write_all(line).and_then(|()| self.file.flush()) {
            if let Err(truncate_err) = self.file.set_len(before) {
                warn!(
                    path = %self.path.display(),
                    error = %truncate_err,
                    "Could not roll back partial log write"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }
}

/// Thread-safe, append-only store of test results.
///
/// Appends are serialized by a mutex around the log writer; reads take a
/// shared lock and never wait on file I/O.
///
/// # Examples
///
/// ```
/// use prompt_harness_db::ResultStore;
///
/// let store = ResultStore::in_memory();
/// assert!(store.is_empty());
/// assert!(store.get("missing").is_none());
/// ```
#[derive(Debug, Default)]
pub struct ResultStore {
    writer: Mutex<Option<LogFile>>,
    records: RwLock<Records>,
}

impl ResultStore {
    /// Creates a store that keeps results in memory only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a store backed by the JSON-lines log at `path`, replaying any
    /// records already in it. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedLog`](crate::DatabaseError::MalformedLog) naming
    /// the first line that is not a valid record,
    /// [`DuplicateId`](crate::DatabaseError::DuplicateId) if the log repeats
    /// a test id, or [`IoError`](crate::DatabaseError::IoError) on I/O
    /// failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut records = Records::default();
        if path.exists() {
            replay(path, &mut records)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(
            path = %path.display(),
            records = records.results.len(),
            "Opened result log"
        );

        Ok(Self {
            writer: Mutex::new(Some(LogFile {
                path: path.to_path_buf(),
                file,
            })),
            records: RwLock::new(records),
        })
    }

    /// Opens the log at `path` when given, an in-memory store otherwise.
    pub fn open_or_in_memory(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory()),
        }
    }

    /// Path of the backing log, if any.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|log| log.path.clone())
    }

    /// Appends a result, writing it to the log first when one is attached.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateId`](crate::DatabaseError::DuplicateId) when the
    /// id is already stored, [`LockPoisoned`](crate::DatabaseError::LockPoisoned)
    /// when an earlier append panicked mid-write, or an I/O or JSON error
    /// from the log write. Nothing is stored when an error is returned.
    pub fn append(&self, result: TestResult) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| DatabaseError::LockPoisoned)?;

        if self.read().index.contains_key(&result.test_id) {
            return Err(DatabaseError::DuplicateId(result.test_id));
        }

        if let Some(log) = writer.as_mut() {
            let mut line = serde_json::to_vec(&result)?;
            line.push(b'\n');
            log.write_line(&line)?;
        }

        debug!(
            test_id = %result.test_id,
            kind = %result.kind(),
            quality_score = result.quality_score(),
            "Stored test result"
        );
        self.records
            .write()
            .map_err(|_| DatabaseError::LockPoisoned)?
            .push(result);
        Ok(())
    }

    /// Looks up a result by test id.
    pub fn get(&self, test_id: &str) -> Option<TestResult> {
        let records = self.read();
        records
            .index
            .get(test_id)
            .map(|&idx| records.results[idx].clone())
    }

    /// Returns results in insertion order, optionally filtered by kind.
    pub fn list(&self, kind: Option<AnalysisKind>) -> Vec<TestResult> {
        self.read()
            .results
            .iter()
            .filter(|result| kind.is_none_or(|kind| result.kind() == kind))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Records are only ever pushed whole, so a poisoned lock still guards a
    // consistent list.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Loads every record of the log at `path` into `records`.
///
/// An unterminated last line that does not parse is truncated away; one
/// that parses is kept and given its newline.
fn replay(path: &Path, records: &mut Records) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let terminated = bytes.last().is_none_or(|b| *b == b'\n');
    let mut lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    // `split` yields an empty slice after a trailing newline.
    let tail = if terminated { None } else { lines.pop() };
    if terminated {
        lines.pop();
    }

    for (idx, line) in lines.iter().enumerate() {
        if line.trim_ascii().is_empty() {
            continue;
        }
        let result: TestResult =
            serde_json::from_slice(line).map_err(|e| DatabaseError::MalformedLog {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
        push_unique(records, result)?;
    }

    let Some(tail) = tail else {
        return Ok(());
    };
    match serde_json::from_slice::<TestResult>(tail) {
        Ok(result) => {
            push_unique(records, result)?;
            OpenOptions::new().append(true).open(path)?.write_all(b"\n")?;
        }
        Err(err) => {
            if !tail.trim_ascii().is_empty() {
                warn!(
                    path = %path.display(),
                    line = lines.len() + 1,
                    bytes = tail.len(),
                    error = %err,
                    "Dropping incomplete last record"
                );
            }
            let tail_start = (bytes.len() - tail.len()) as u64;
            OpenOptions::new().write(true).open(path)?.set_len(tail_start)?;
        }
    }
    Ok(())
}

fn push_unique(records: &mut Records, result: TestResult) -> Result<()> {
    if records.index.contains_key(&result.test_id) {
        return Err(DatabaseError::DuplicateId(result.test_id));
    }
    records.push(result);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use prompt_harness_core::{
        AnalysisRequest, ExtractedMetrics, ModelId, QualityTier, RawResponse, ValidationResult,
    };

    pub(crate) fn sample_result(id: &str, kind: AnalysisKind, score: f64) -> TestResult {
        TestResult {
            test_id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            request: AnalysisRequest::new("Logistics last-mile delivery", ModelId::Qwen, kind)
                .unwrap(),
            prompt_preview: "You are a financial analyst...".to_string(),
            response: RawResponse::success("Opening Overview", 850),
            metrics: ExtractedMetrics::default(),
            validation: ValidationResult {
                quality_score: score,
                section_coverage: 0.5,
                element_coverage: 0.5,
                response_length: 16,
                missing_requirements: Vec::new(),
                recommendations: Vec::new(),
                sections_found: Vec::new(),
                element_hits: Vec::new(),
                indicators: Vec::new(),
                quality_tier: QualityTier::Low,
                passed: false,
            },
            response_digest: "ab".repeat(32),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_in_memory_append_and_get() {
        let store = ResultStore::in_memory();
        store
            .append(sample_result("a", AnalysisKind::Tam, 0.4))
            .unwrap();
        store
            .append(sample_result("b", AnalysisKind::Dcf, 0.6))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b").unwrap().kind(), AnalysisKind::Dcf);
        assert!(store.get("c").is_none());
        assert!(store.log_path().is_none());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let store = ResultStore::in_memory();
        store
            .append(sample_result("a", AnalysisKind::Tam, 0.4))
            .unwrap();
        let err = store
            .append(sample_result("a", AnalysisKind::Tam, 0.9))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateId(ref id) if id == "a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().quality_score(), 0.4);
    }

    #[test]
    fn test_list_filters_by_kind_in_insertion_order() {
        let store = ResultStore::in_memory();
        for (id, kind) in [
            ("1", AnalysisKind::Tam),
            ("2", AnalysisKind::Dcf),
            ("3", AnalysisKind::Tam),
        ] {
            store.append(sample_result(id, kind, 0.5)).unwrap();
        }

        let ids: Vec<_> = store
            .list(Some(AnalysisKind::Tam))
            .into_iter()
            .map(|r| r.test_id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(store.list(None).len(), 3);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.jsonl");
        let store = ResultStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(path.exists());
        assert_eq!(store.log_path(), Some(path));
    }

    #[test]
    fn test_open_drops_torn_last_line_and_keeps_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let good = serde_json::to_string(&sample_result("a", AnalysisKind::Tam, 0.4)).unwrap();
        std::fs::write(&path, format!("{good}\n{{\"testId\":\"b\",\"times")).unwrap();

        let store = ResultStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_some());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{good}\n")
        );

        store
            .append(sample_result("b", AnalysisKind::Dcf, 0.6))
            .unwrap();
        drop(store);

        let reopened = ResultStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("b").unwrap().kind(), AnalysisKind::Dcf);
    }

    #[test]
    fn test_open_keeps_complete_record_missing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let a = serde_json::to_string(&sample_result("a", AnalysisKind::Tam, 0.4)).unwrap();
        let b = serde_json::to_string(&sample_result("b", AnalysisKind::Tam, 0.5)).unwrap();
        std::fs::write(&path, format!("{a}\n{b}")).unwrap();

        let store = ResultStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        store
            .append(sample_result("c", AnalysisKind::Tam, 0.6))
            .unwrap();
        drop(store);

        assert_eq!(ResultStore::open(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_open_rejects_record_with_blank_company_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let mut record =
            serde_json::to_value(sample_result("a", AnalysisKind::Tam, 0.4)).unwrap();
        record["request"]["companyContext"] = serde_json::Value::from("  ");
        std::fs::write(&path, format!("{record}\n")).unwrap();

        let err = ResultStore::open(&path).unwrap_err();
        match err {
            DatabaseError::MalformedLog { line, reason, .. } => {
                assert_eq!(line, 1);
                assert!(reason.contains("company context cannot be empty"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_open_reports_malformed_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let good = serde_json::to_string(&sample_result("a", AnalysisKind::Tam, 0.4)).unwrap();
        std::fs::write(&path, format!("{good}\n\n{{not json\n")).unwrap();

        let err = ResultStore::open(&path).unwrap_err();
        match err {
            DatabaseError::MalformedLog { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
