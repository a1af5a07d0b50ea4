use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
