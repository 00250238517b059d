#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("row {row}: cannot parse {field} from {value:?}: {reason}")]
    Parse {
        row: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("row {row}: invalid {field}: {reason}")]
    Validation {
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
