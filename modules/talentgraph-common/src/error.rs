use thiserror::Error;

#[derive(Error, Debug)]
pub enum TalentGraphError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
