use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementPipelineError {
    #[error("Unknown document type: {0}")]
    UnknownDocType(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("Invalid formula table: {0}")]
    InvalidFormulaTable(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "llm")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, StatementPipelineError>;
