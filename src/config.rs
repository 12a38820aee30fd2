use crate::constants;
use crate::error::{PipelineError, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration for a single pipeline run. Pure value: construction
/// performs no filesystem side effects; call [`IngestionConfig::provision`]
/// and [`ValidationConfig::provision`] before running the stages.
#[derive(Debug, Clone)]
pub struct PipelineRunConfig {
    pub pipeline_name: String,
    pub artifact_dir: PathBuf,
}

impl PipelineRunConfig {
    /// Create a run config rooted at `<base>/Artifacts/<timestamp>`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let timestamp = Local::now().format("%m_%d_%Y_%H_%M_%S").to_string();
        Self {
            pipeline_name: constants::PIPELINE_NAME.to_string(),
            artifact_dir: base_dir
                .as_ref()
                .join(constants::ARTIFACT_DIR)
                .join(timestamp),
        }
    }
}

/// Per-run settings for the data ingestion stage, derived deterministically
/// from the run config.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub table_name: String,
    pub schema_name: String,
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    pub train_test_split_ratio: f64,
}

impl IngestionConfig {
    pub fn new(run_config: &PipelineRunConfig) -> Self {
        let ingestion_dir = run_config
            .artifact_dir
            .join(constants::DATA_INGESTION_DIR_NAME);
        Self {
            table_name: constants::SOURCE_TABLE_NAME.to_string(),
            schema_name: constants::SOURCE_SCHEMA_NAME.to_string(),
            feature_store_file_path: ingestion_dir
                .join(constants::DATA_INGESTION_FEATURE_STORE_DIR)
                .join(constants::FEATURE_STORE_FILE_NAME),
            training_file_path: ingestion_dir
                .join(constants::DATA_INGESTION_INGESTED_DIR)
                .join(constants::TRAIN_FILE_NAME),
            testing_file_path: ingestion_dir
                .join(constants::DATA_INGESTION_INGESTED_DIR)
                .join(constants::TEST_FILE_NAME),
            train_test_split_ratio: constants::DATA_INGESTION_SPLIT_RATIO,
        }
    }

    /// Override the train/test split ratio. The ratio is the test fraction
    /// and must lie strictly between 0 and 1.
    pub fn with_split_ratio(mut self, ratio: f64) -> Result<Self> {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PipelineError::Config(format!(
                "split ratio must be in (0, 1), got {ratio}"
            )));
        }
        self.train_test_split_ratio = ratio;
        Ok(self)
    }

    /// Create the directories implied by the configured file paths.
    pub fn provision(&self) -> Result<()> {
        for path in [
            &self.feature_store_file_path,
            &self.training_file_path,
            &self.testing_file_path,
        ] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Per-run settings for the data validation stage.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub drift_report_file_path: PathBuf,
    pub schema_file_path: PathBuf,
}

impl ValidationConfig {
    pub fn new(run_config: &PipelineRunConfig) -> Self {
        let validation_dir = run_config
            .artifact_dir
            .join(constants::DATA_VALIDATION_DIR_NAME);
        Self {
            valid_train_file_path: validation_dir
                .join(constants::DATA_VALIDATION_VALID_DIR)
                .join(constants::TRAIN_FILE_NAME),
            valid_test_file_path: validation_dir
                .join(constants::DATA_VALIDATION_VALID_DIR)
                .join(constants::TEST_FILE_NAME),
            drift_report_file_path: validation_dir
                .join(constants::DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(constants::DRIFT_REPORT_FILE_NAME),
            schema_file_path: PathBuf::from(constants::SCHEMA_FILE_PATH),
        }
    }

    /// Point validation at a non-default schema definition file.
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file_path = path.into();
        self
    }

    /// Create the directories implied by the configured file paths.
    pub fn provision(&self) -> Result<()> {
        for path in [
            &self.valid_train_file_path,
            &self.valid_test_file_path,
            &self.drift_report_file_path,
        ] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
