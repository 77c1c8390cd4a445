use thiserror::Error;

#[derive(Debug, Error)]
pub enum AquadashError {
    #[error("required columns missing after mapping: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("no risk policy named '{0}' (built-in or loaded)")]
    PolicyNotFound(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("failed to serialize JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
