use crate::artifact::IngestionArtifact;
use crate::config::IngestionConfig;
use crate::error::{PipelineError, Result, StageContext as _};
use crate::frame::DataFrame;
use crate::source::SourceStore;
use rand::seq::SliceRandom as _;
use tracing::info;

/// Data ingestion stage: fetch the raw table, snapshot it to the feature
/// store, split into train/test files and hand the split paths downstream as
/// an [`IngestionArtifact`].
///
/// The stage owns the source store handle for its whole lifetime; `run`
/// consumes the stage, so the connection is released on every exit path.
pub struct DataIngestion {
    config: IngestionConfig,
    source: SourceStore,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig, source: SourceStore) -> Self {
        Self { config, source }
    }

    /// Fetch the full row set from the configured source table.
    fn fetch(&self) -> Result<DataFrame> {
        self.source
            .fetch_table(&self.config.schema_name, &self.config.table_name)
    }

    /// Write the entire fetched frame to the feature-store path. Full
    /// overwrite of any prior snapshot, not an append.
    fn export_feature_store(&self, frame: &DataFrame) -> Result<()> {
        frame.write_csv(&self.config.feature_store_file_path)?;
        info!(
            "Exported {} records to feature store {}",
            frame.n_rows(),
            self.config.feature_store_file_path.display()
        );
        Ok(())
    }

    /// Randomly partition the frame into train/test by the configured test
    /// fraction and write both files. No seed is fixed, so the partition is
    /// not reproducible across runs.
    ///
    /// A partition that would leave either side empty is an error: both
    /// split files must carry at least one data row.
    fn split_train_test(&self, frame: &DataFrame) -> Result<()> {
        let n = frame.n_rows();
        if n == 0 {
            return Err(PipelineError::Split(
                "cannot split an empty row set".to_string(),
            ));
        }
        let test_count = ((n as f64) * self.config.train_test_split_ratio).ceil() as usize;
        if test_count >= n {
            return Err(PipelineError::Split(format!(
                "ratio {} of {n} rows leaves no train rows",
                self.config.train_test_split_ratio
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rand::thread_rng());

        let test_frame = frame.take_rows(&indices[..test_count]);
        let train_frame = frame.take_rows(&indices[test_count..]);
        info!(
            "Performed train-test split: {} train rows, {} test rows",
            train_frame.n_rows(),
            test_frame.n_rows()
        );

        train_frame.write_csv(&self.config.training_file_path)?;
        test_frame.write_csv(&self.config.testing_file_path)?;
        info!("Exported train and test files");
        Ok(())
    }

    /// Full stage: fetch -> feature store snapshot -> train/test split.
    ///
    /// The snapshot write is not transactional with the split: a failure
    /// after the snapshot leaves a valid snapshot on disk and returns no
    /// artifact. Consuming `self` drops the store connection regardless of
    /// outcome.
    pub fn run(self) -> Result<IngestionArtifact> {
        let result: Result<IngestionArtifact> = (|| {
            let frame = self.fetch()?;
            self.export_feature_store(&frame)?;
            self.split_train_test(&frame)?;
            Ok(IngestionArtifact {
                trained_file_path: self.config.training_file_path.clone(),
                test_file_path: self.config.testing_file_path.clone(),
            })
        })();
        result.in_stage("data ingestion")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineRunConfig;
    use rusqlite::Connection;
    use std::path::Path;

    fn seed_database(path: &Path, rows: usize) {
        let conn = Connection::open(path).expect("open");
        conn.execute("CREATE TABLE phishing_data (data TEXT NOT NULL)", [])
            .expect("create");
        for i in 0..rows {
            let payload = format!(
                r#"{{"URL_Length": {}, "web_traffic": {}, "Result": {}}}"#,
                i % 5,
                i % 7,
                if i % 2 == 0 { 1 } else { -1 }
            );
            conn.execute("INSERT INTO phishing_data (data) VALUES (?1)", [payload])
                .expect("insert");
        }
    }

    #[test]
    fn run_produces_artifact_and_all_three_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("source.db");
        seed_database(&db_path, 50);

        let run_config = PipelineRunConfig::new(tmp.path());
        let config = IngestionConfig::new(&run_config);
        config.provision().expect("provision");
        let feature_store_path = config.feature_store_file_path.clone();

        let ingestion = DataIngestion::new(config, SourceStore::open(&db_path).expect("store"));
        let artifact = ingestion.run().expect("run");

        assert!(feature_store_path.exists());
        let train = DataFrame::read_csv(&artifact.trained_file_path).expect("train");
        let test = DataFrame::read_csv(&artifact.test_file_path).expect("test");
        assert_eq!(train.n_rows() + test.n_rows(), 50);
        assert_eq!(test.n_rows(), 10);
        assert_eq!(train.columns(), test.columns());
    }

    #[test]
    fn split_respects_other_ratios() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("source.db");
        seed_database(&db_path, 101);

        let run_config = PipelineRunConfig::new(tmp.path());
        let config = IngestionConfig::new(&run_config)
            .with_split_ratio(0.3)
            .expect("ratio");
        config.provision().expect("provision");

        let ingestion = DataIngestion::new(config, SourceStore::open(&db_path).expect("store"));
        let artifact = ingestion.run().expect("run");

        let train = DataFrame::read_csv(&artifact.trained_file_path).expect("train");
        let test = DataFrame::read_csv(&artifact.test_file_path).expect("test");
        assert_eq!(train.n_rows() + test.n_rows(), 101);
        // ceil(101 * 0.3) = 31
        assert_eq!(test.n_rows(), 31);
    }

    #[test]
    fn run_fails_on_empty_source_table() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("source.db");
        seed_database(&db_path, 0);

        let run_config = PipelineRunConfig::new(tmp.path());
        let config = IngestionConfig::new(&run_config);
        config.provision().expect("provision");
        let train_path = config.training_file_path.clone();

        let ingestion = DataIngestion::new(config, SourceStore::open(&db_path).expect("store"));
        let err = ingestion.run().unwrap_err();
        assert!(err.to_string().contains("cannot split an empty row set"));
        // No artifact means no split files were produced.
        assert!(!train_path.exists());
    }

    #[test]
    fn run_fails_when_train_partition_would_be_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("source.db");
        seed_database(&db_path, 1);

        let run_config = PipelineRunConfig::new(tmp.path());
        // ceil(1 * 0.5) = 1 test row, which would leave train empty.
        let config = IngestionConfig::new(&run_config)
            .with_split_ratio(0.5)
            .expect("ratio");
        config.provision().expect("provision");

        let ingestion = DataIngestion::new(config, SourceStore::open(&db_path).expect("store"));
        let err = ingestion.run().unwrap_err();
        assert!(err.to_string().contains("leaves no train rows"));
    }

    #[test]
    fn failed_run_reports_the_ingestion_stage() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("empty.db");
        // No table seeded: the fetch fails.
        let run_config = PipelineRunConfig::new(tmp.path());
        let config = IngestionConfig::new(&run_config);
        config.provision().expect("provision");

        let ingestion = DataIngestion::new(config, SourceStore::open(&db_path).expect("store"));
        let err = ingestion.run().unwrap_err();
        assert!(err.to_string().contains("data ingestion failed"));
    }
}
