use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Output of a successful ingestion run: the two split files. Both paths
/// reference existing, non-empty delimited files when the artifact is
/// returned. Consumed exactly once by validation.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionArtifact {
    pub trained_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

/// Output of a successful validation run.
///
/// `validation_status` reflects the drift outcome only: schema-conformance
/// failures abort the run with an error instead of producing a false status.
/// The invalid path fields are part of the artifact shape but are never
/// populated in the current design.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationArtifact {
    pub validation_status: bool,
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub invalid_train_file_path: Option<PathBuf>,
    pub invalid_test_file_path: Option<PathBuf>,
    pub drift_report_file_path: PathBuf,
}

/// Drift outcome for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub p_value: f64,
    pub drift_detected: bool,
}

/// Per-column drift report: one entry per column of the train frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriftReport {
    pub columns: BTreeMap<String, ColumnDrift>,
}

impl DriftReport {
    pub fn insert(&mut self, column: impl Into<String>, p_value: f64, drift_detected: bool) {
        self.columns.insert(
            column.into(),
            ColumnDrift {
                p_value,
                drift_detected,
            },
        );
    }

    /// True iff no column drifted.
    pub fn drift_free(&self) -> bool {
        self.columns.values().all(|c| !c.drift_detected)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let report: DriftReport = serde_json::from_str(&content)?;
        Ok(report)
    }
}
