use thiserror::Error;

/// The main error type for Codelink operations
#[derive(Debug, Error)]
pub enum CodelinkError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing context field '{0}': a previous step must populate it")]
    MissingContext(&'static str),
}

/// Result type alias for Codelink operations
pub type CodelinkResult<T> = Result<T, CodelinkError>;
