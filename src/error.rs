use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Problem executing {analyzer}: {message}")]
    BackendExecution { analyzer: String, message: String },

    #[error("Malformed finding #{index} from {analyzer}: missing {field}")]
    MalformedFinding {
        analyzer: String,
        index: usize,
        field: &'static str,
    },

    #[error("Cannot combine coverage {left} with {right}: {reason}")]
    CoverageMismatch {
        left: String,
        right: String,
        reason: &'static str,
    },

    #[error("Invalid coverage for {key}: covered {covered} exceeds total {total}")]
    InvalidCoverage {
        key: String,
        covered: u64,
        total: u64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown coverage format")]
    UnknownFormat,
}

pub type Result<T> = std::result::Result<T, CodegateError>;
