use polars::error::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to load table '{table}': {source}")]
    Load {
        table: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: String,
    },

    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
