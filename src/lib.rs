pub mod artifact;
pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod ingestion;
pub mod logging;
pub mod schema;
pub mod source;
pub mod stats;
pub mod validation;
