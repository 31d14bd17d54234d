use thiserror::Error;

/// Violations of the tool-use protocol found while reading a model response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{0}")]
    InvalidAction(String),

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Unexpected tool: {0}")]
    UnexpectedTool(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum GruntyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Transport(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("Please enter instructions before running the agent.")]
    EmptyInstructions,

    #[error("Run task ended abnormally: {0}")]
    RunTask(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type GruntyResult<T> = Result<T, GruntyError>;
