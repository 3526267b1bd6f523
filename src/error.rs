use thiserror::Error;

pub type Result<T> = std::result::Result<T, FraudError>;

#[derive(Debug, Error)]
pub enum FraudError {
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("{0}")]
    Parse(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("feature count mismatch: model expects {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No fraud data available to save.")]
    NoData,

    #[error("model error: {0}")]
    Model(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FraudError {
    pub fn load(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        FraudError::Load {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    // Title of the notice shown when a handler fails with this error
    pub fn notice_title(&self) -> &'static str {
        match self {
            FraudError::Parse(_) | FraudError::DimensionMismatch { .. } => "Input Error",
            FraudError::NoData => "No Data",
            _ => "Error",
        }
    }
}
