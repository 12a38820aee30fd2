/// Pipeline-wide constants: file names, directory layout and defaults shared
/// by the configuration model and the stages.

// Pipeline identity
pub const PIPELINE_NAME: &str = "netsec_pipeline";
pub const ARTIFACT_DIR: &str = "Artifacts";

// File names
pub const FEATURE_STORE_FILE_NAME: &str = "phishing_data.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const DRIFT_REPORT_FILE_NAME: &str = "report.json";

// Source store
pub const SOURCE_TABLE_NAME: &str = "phishing_data";
pub const SOURCE_SCHEMA_NAME: &str = "main";
pub const DATABASE_PATH_ENV: &str = "NETSEC_DATABASE_PATH";
pub const DEFAULT_DATABASE_PATH: &str = "netsec.db";

// Data ingestion layout
pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
pub const DATA_INGESTION_SPLIT_RATIO: f64 = 0.2;

// Data validation layout
pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_VALID_DIR: &str = "validated";
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
pub const SCHEMA_FILE_PATH: &str = "data_schema/schema.toml";

// Drift detection
pub const DRIFT_P_VALUE_THRESHOLD: f64 = 0.05;
