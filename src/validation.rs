use crate::artifact::{DriftReport, IngestionArtifact, ValidationArtifact};
use crate::config::ValidationConfig;
use crate::constants;
use crate::error::{PipelineError, Result, StageContext as _};
use crate::frame::DataFrame;
use crate::schema::SchemaDefinition;
use crate::stats::ks_2samp;
use tracing::{error, info};

/// Data validation stage: check the ingested train/test files against the
/// static schema definition, detect per-column distributional drift between
/// the splits, and persist the validated files plus a drift report.
pub struct DataValidation {
    ingestion_artifact: IngestionArtifact,
    config: ValidationConfig,
    schema: SchemaDefinition,
}

impl DataValidation {
    /// Loads the schema definition once at construction.
    pub fn new(ingestion_artifact: IngestionArtifact, config: ValidationConfig) -> Result<Self> {
        let schema = SchemaDefinition::load(&config.schema_file_path)?;
        Ok(Self {
            ingestion_artifact,
            config,
            schema,
        })
    }

    /// True iff the frame has exactly as many columns as the schema
    /// declares. Count check only: column names are not compared.
    pub fn check_column_count(&self, frame: &DataFrame) -> bool {
        let required = self.schema.column_count();
        info!(
            "Required number of columns: {required}, frame has: {}",
            frame.n_columns()
        );
        frame.n_columns() == required
    }

    /// Checks that every schema-declared numerical column is present by
    /// name. Returns the missing names; an empty list means the check
    /// passed. Extra non-declared columns are ignored.
    pub fn check_numerical_columns(&self, frame: &DataFrame) -> Vec<String> {
        let missing: Vec<String> = self
            .schema
            .numerical_columns
            .iter()
            .filter(|name| !frame.has_column(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            error!("Missing numerical columns: {missing:?}");
        }
        missing
    }

    /// Runs a two-sample KS test for every column of the train frame (in
    /// train column order) against the same-named test column. Persists the
    /// per-column report regardless of outcome and returns true iff no
    /// column drifted.
    pub fn detect_drift(
        &self,
        train_frame: &DataFrame,
        test_frame: &DataFrame,
        threshold: f64,
    ) -> Result<(bool, DriftReport)> {
        let mut report = DriftReport::default();
        let mut status = true;

        for column in train_frame.columns() {
            let base = train_frame.numeric_column(column)?;
            let current = test_frame.numeric_column(column)?;
            if base.is_empty() || current.is_empty() {
                return Err(PipelineError::Statistical {
                    column: column.clone(),
                    message: "no values available for comparison".to_string(),
                });
            }

            let outcome = ks_2samp(&base, &current)?;
            let drift_found = outcome.p_value < threshold;
            if drift_found {
                status = false;
            }
            report.insert(column.clone(), outcome.p_value, drift_found);
        }

        report.save(&self.config.drift_report_file_path)?;
        info!(
            "Drift report written to {}",
            self.config.drift_report_file_path.display()
        );
        Ok((status, report))
    }

    /// Full stage: structural checks on both frames, then drift detection.
    ///
    /// All structural findings are accumulated and raised together as a
    /// single combined error; no artifact is produced in that case. If the
    /// structural checks pass, the drift result becomes the artifact's
    /// `validation_status` and the validated copies are written out.
    pub fn run(self) -> Result<ValidationArtifact> {
        let result: Result<ValidationArtifact> = (|| {
            let train_frame = DataFrame::read_csv(&self.ingestion_artifact.trained_file_path)?;
            let test_frame = DataFrame::read_csv(&self.ingestion_artifact.test_file_path)?;

            let mut error_message = String::new();
            if !self.check_column_count(&train_frame) {
                error_message.push_str("Train data does not contain all required columns.\n");
            }
            if !self.check_column_count(&test_frame) {
                error_message.push_str("Test data does not contain all required columns.\n");
            }
            let missing_train = self.check_numerical_columns(&train_frame);
            if !missing_train.is_empty() {
                error_message.push_str(&format!(
                    "Train data missing required numerical columns: {}.\n",
                    missing_train.join(", ")
                ));
            }
            let missing_test = self.check_numerical_columns(&test_frame);
            if !missing_test.is_empty() {
                error_message.push_str(&format!(
                    "Test data missing required numerical columns: {}.\n",
                    missing_test.join(", ")
                ));
            }
            if !error_message.is_empty() {
                return Err(PipelineError::Validation(error_message));
            }
            info!("Structural validation passed");

            let (status, _report) = self.detect_drift(
                &train_frame,
                &test_frame,
                constants::DRIFT_P_VALUE_THRESHOLD,
            )?;

            train_frame.write_csv(&self.config.valid_train_file_path)?;
            test_frame.write_csv(&self.config.valid_test_file_path)?;
            info!("Validated train and test files written");

            Ok(ValidationArtifact {
                validation_status: status,
                valid_train_file_path: self.ingestion_artifact.trained_file_path.clone(),
                valid_test_file_path: self.ingestion_artifact.test_file_path.clone(),
                invalid_train_file_path: None,
                invalid_test_file_path: None,
                drift_report_file_path: self.config.drift_report_file_path.clone(),
            })
        })();
        result.in_stage("data validation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineRunConfig, ValidationConfig};
    use crate::schema::{ColumnSpec, SchemaDefinition};
    use std::path::Path;

    fn write_schema(dir: &Path, names: &[&str], numerical: &[&str]) -> std::path::PathBuf {
        let schema = SchemaDefinition {
            columns: names
                .iter()
                .map(|name| ColumnSpec {
                    name: (*name).to_string(),
                    dtype: "int64".to_string(),
                })
                .collect(),
            numerical_columns: numerical.iter().map(|n| (*n).to_string()).collect(),
        };
        let path = dir.join("schema.toml");
        schema.save(&path).expect("save schema");
        path
    }

    fn write_frame(path: &Path, columns: &[&str], rows: &[&[&str]]) {
        let frame = DataFrame::from_parts(
            columns.iter().map(|c| (*c).to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| Some((*cell).to_string())).collect())
                .collect(),
        )
        .expect("frame");
        frame.write_csv(path).expect("write");
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        artifact: IngestionArtifact,
        config: ValidationConfig,
    }

    fn fixture(schema_names: &[&str], numerical: &[&str]) -> Fixture {
        let tmp = tempfile::tempdir().expect("tempdir");
        let schema_path = write_schema(tmp.path(), schema_names, numerical);
        let run_config = PipelineRunConfig::new(tmp.path());
        let config = ValidationConfig::new(&run_config).with_schema_file(schema_path);
        config.provision().expect("provision");
        let artifact = IngestionArtifact {
            trained_file_path: tmp.path().join("train.csv"),
            test_file_path: tmp.path().join("test.csv"),
        };
        Fixture {
            _tmp: tmp,
            artifact,
            config,
        }
    }

    #[test]
    fn column_count_check_ignores_names() {
        let fx = fixture(&["a", "b"], &[]);
        write_frame(&fx.artifact.trained_file_path, &["x", "y"], &[&["1", "2"]]);
        let validation = DataValidation::new(fx.artifact.clone(), fx.config).expect("new");
        let frame = DataFrame::read_csv(&fx.artifact.trained_file_path).expect("read");
        // Right count, wrong names: the count-only check passes.
        assert!(validation.check_column_count(&frame));
    }

    #[test]
    fn column_count_check_fails_on_wrong_count() {
        let fx = fixture(&["a", "b", "c"], &[]);
        write_frame(&fx.artifact.trained_file_path, &["a", "b"], &[&["1", "2"]]);
        let validation = DataValidation::new(fx.artifact.clone(), fx.config).expect("new");
        let frame = DataFrame::read_csv(&fx.artifact.trained_file_path).expect("read");
        assert!(!validation.check_column_count(&frame));
    }

    #[test]
    fn numerical_check_reports_every_missing_name() {
        let fx = fixture(&["a", "b", "c"], &["a", "b", "c"]);
        write_frame(&fx.artifact.trained_file_path, &["a", "extra"], &[&["1", "2"]]);
        let validation = DataValidation::new(fx.artifact.clone(), fx.config).expect("new");
        let frame = DataFrame::read_csv(&fx.artifact.trained_file_path).expect("read");
        let missing = validation.check_numerical_columns(&frame);
        assert_eq!(missing, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn numerical_check_allows_extra_columns() {
        let fx = fixture(&["a"], &["a"]);
        write_frame(
            &fx.artifact.trained_file_path,
            &["a", "unexpected"],
            &[&["1", "2"]],
        );
        let validation = DataValidation::new(fx.artifact.clone(), fx.config).expect("new");
        let frame = DataFrame::read_csv(&fx.artifact.trained_file_path).expect("read");
        assert!(validation.check_numerical_columns(&frame).is_empty());
    }

    #[test]
    fn run_aggregates_all_structural_failures() {
        // Train is missing one column; test is missing a different
        // numerical column. Both findings must appear in one error.
        let fx = fixture(&["a", "b", "c"], &["a", "c"]);
        write_frame(&fx.artifact.trained_file_path, &["a", "c"], &[&["1", "2"]]);
        write_frame(
            &fx.artifact.test_file_path,
            &["a", "b", "x"],
            &[&["1", "2", "3"]],
        );
        let validation = DataValidation::new(fx.artifact, fx.config).expect("new");
        let err = validation.run().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("data validation failed"));
        let message = format!("{:#}", anyhow::Error::from(err));
        assert!(message.contains("Train data does not contain all required columns"));
        assert!(message.contains("Test data missing required numerical columns: c"));
    }

    #[test]
    fn run_detects_drift_between_disjoint_ranges() {
        let fx = fixture(&["a", "b"], &["a", "b"]);
        let train_rows: Vec<Vec<Option<String>>> = (0..80)
            .map(|i| vec![Some(format!("{}", i % 10)), Some("1".to_string())])
            .collect();
        let test_rows: Vec<Vec<Option<String>>> = (0..20)
            .map(|i| vec![Some(format!("{}", 100 + i)), Some("1".to_string())])
            .collect();
        DataFrame::from_parts(vec!["a".to_string(), "b".to_string()], train_rows)
            .expect("train")
            .write_csv(&fx.artifact.trained_file_path)
            .expect("write train");
        DataFrame::from_parts(vec!["a".to_string(), "b".to_string()], test_rows)
            .expect("test")
            .write_csv(&fx.artifact.test_file_path)
            .expect("write test");

        let report_path = fx.config.drift_report_file_path.clone();
        let validation = DataValidation::new(fx.artifact, fx.config).expect("new");
        let artifact = validation.run().expect("run");

        // Column "a" drifts, so the overall status flips to false; the
        // artifact is still produced and the report still written.
        assert!(!artifact.validation_status);
        assert!(artifact.invalid_train_file_path.is_none());
        assert!(artifact.invalid_test_file_path.is_none());
        let report = DriftReport::load(&report_path).expect("report");
        assert!(report.columns["a"].drift_detected);
        assert!(!report.columns["b"].drift_detected);
    }

    #[test]
    fn run_passes_for_identically_distributed_splits() {
        let fx = fixture(&["a"], &["a"]);
        let train_rows: Vec<Vec<Option<String>>> =
            (0..80).map(|i| vec![Some(format!("{}", i % 4))]).collect();
        let test_rows: Vec<Vec<Option<String>>> =
            (0..20).map(|i| vec![Some(format!("{}", i % 4))]).collect();
        DataFrame::from_parts(vec!["a".to_string()], train_rows)
            .expect("train")
            .write_csv(&fx.artifact.trained_file_path)
            .expect("write train");
        DataFrame::from_parts(vec!["a".to_string()], test_rows)
            .expect("test")
            .write_csv(&fx.artifact.test_file_path)
            .expect("write test");

        let valid_train = fx.config.valid_train_file_path.clone();
        let valid_test = fx.config.valid_test_file_path.clone();
        let trained_file_path = fx.artifact.trained_file_path.clone();
        let validation = DataValidation::new(fx.artifact, fx.config).expect("new");
        let artifact = validation.run().expect("run");

        assert!(artifact.validation_status);
        // The artifact's valid paths are the ingestion paths; the validated
        // copies are written separately.
        assert_eq!(artifact.valid_train_file_path, trained_file_path);
        assert!(valid_train.exists());
        assert!(valid_test.exists());
    }

    #[test]
    fn drift_on_column_absent_from_test_is_fatal() {
        let fx = fixture(&["a", "b"], &[]);
        write_frame(&fx.artifact.trained_file_path, &["a", "b"], &[&["1", "2"]]);
        write_frame(&fx.artifact.test_file_path, &["a", "x"], &[&["1", "2"]]);
        let validation = DataValidation::new(fx.artifact, fx.config).expect("new");
        // Structural checks pass (count matches, no numerical columns
        // declared) but the drift comparison cannot find "b" in test.
        let err = validation.run().unwrap_err();
        let message = format!("{:#}", anyhow::Error::from(err));
        assert!(message.contains("column 'b'"));
    }
}
