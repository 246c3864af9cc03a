use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),
    #[error("Column '{0}' is not numeric")]
    NonNumericTarget(String),
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("File processing error: {0}")]
    FileProcessingError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl AppError {
    pub fn sheet_not_found(sheet: &str) -> Self {
        AppError::NotFound(format!("sheet '{}' not found", sheet))
    }

    pub fn column_not_found(column: &str, sheet: &str) -> Self {
        AppError::NotFound(format!("column '{}' not found in sheet '{}'", column, sheet))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<calamine::XlsxError> for AppError {
    fn from(err: calamine::XlsxError) -> Self {
        AppError::FileProcessingError(format!("Failed to open Excel file: {}", err))
    }
}

impl AppError {
    /// Recovers an owned error from one shared between cache waiters.
    pub fn from_shared(err: std::sync::Arc<AppError>) -> Self {
        std::sync::Arc::try_unwrap(err).unwrap_or_else(|shared| match shared.as_ref() {
            AppError::NotFound(msg) => AppError::NotFound(msg.clone()),
            AppError::InvalidAggregation(msg) => AppError::InvalidAggregation(msg.clone()),
            AppError::NonNumericTarget(msg) => AppError::NonNumericTarget(msg.clone()),
            AppError::EmptyDataset(msg) => AppError::EmptyDataset(msg.clone()),
            AppError::InvalidInput(msg) => AppError::InvalidInput(msg.clone()),
            AppError::FileProcessingError(msg) => AppError::FileProcessingError(msg.clone()),
            AppError::IoError(err) => AppError::IoError(std::io::Error::new(err.kind(), err.to_string())),
            AppError::ParseError(msg) => AppError::ParseError(msg.clone()),
        })
    }
}
