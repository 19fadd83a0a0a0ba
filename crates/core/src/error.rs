use thiserror::Error;

pub type PersonaResult<T> = Result<T, PersonaError>;

#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Customer not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for PersonaError {
    fn from(err: config::ConfigError) -> Self {
        PersonaError::Config(err.to_string())
    }
}
