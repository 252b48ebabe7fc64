//! JSON export of stored results.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use prompt_harness_core::{AnalysisKind, ResultBundle};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::Result;
use crate::store::ResultStore;

/// What an export wrote and how to verify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub total_tests: usize,
    /// Hex SHA-256 digest of the written file.
    pub checksum: String,
}

/// Default export file name for `kind` (`tam_test_results.json`, ...).
pub fn default_export_name(kind: Option<AnalysisKind>) -> String {
    match kind {
        Some(kind) => format!("{kind}_test_results.json"),
        None => "test_results.json".to_string(),
    }
}

/// Computes the SHA-256 hex digest of a file.
///
/// # Errors
///
/// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot be
/// read.
pub fn file_checksum(path: impl AsRef<Path>) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

impl ResultStore {
    /// Snapshots the stored results, optionally filtered by kind, into an
    /// export bundle stamped with the current time.
    pub fn bundle(&self, kind: Option<AnalysisKind>) -> ResultBundle {
        ResultBundle::new(kind, Utc::now(), self.list(kind))
    }

    /// Writes [`bundle`](Self::bundle) to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be written, or [`JsonError`](crate::DatabaseError::JsonError) if
    /// serialization fails.
    pub fn export_to_file(
        &self,
        kind: Option<AnalysisKind>,
        path: impl AsRef<Path>,
    ) -> Result<ExportReceipt> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let bundle = self.bundle(kind);
        {
            let file = std::fs::File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &bundle)?;
        }

        let checksum = file_checksum(path)?;
        info!(
            path = %path.display(),
            total_tests = bundle.total_tests,
            kind = ?kind,
            "Exported results"
        );
        Ok(ExportReceipt {
            path: path.to_path_buf(),
            total_tests: bundle.total_tests,
            checksum,
        })
    }
}
