use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema definition error: {0}")]
    SchemaParse(#[from] toml::de::Error),

    #[error("schema serialization error: {0}")]
    SchemaWrite(#[from] toml::ser::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("train-test split error: {0}")]
    Split(String),

    #[error("structural validation failed:\n{0}")]
    Validation(String),

    #[error("drift comparison failed for column '{column}': {message}")]
    Statistical { column: String, message: String },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Wrap this error with the name of the pipeline stage it aborted.
    pub fn in_stage(self, stage: &'static str) -> Self {
        PipelineError::Stage {
            stage,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Attaches stage context to errors at stage boundaries. Applied once in each
/// component's `run()` rather than inside every individual operation.
pub trait StageContext<T> {
    fn in_stage(self, stage: &'static str) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn in_stage(self, stage: &'static str) -> Result<T> {
        self.map_err(|e| e.in_stage(stage))
    }
}
