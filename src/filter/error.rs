use thiserror::Error;

/// Errors that can occur when compiling filter expressions
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid regex /{pattern}/: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
