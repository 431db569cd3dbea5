use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("no valid values for '{parameter}': {detail}")]
    NoCandidates { parameter: String, detail: String },

    #[error("invariant violated: {0}")]
    AmbiguousState(String),

    #[error("task '{task}' failed: {detail}")]
    Provisioning { task: String, detail: String },

    #[error("progress channel unreachable: {0}")]
    Render(String),

    #[error("invalid value for '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("service call failed: {0}")]
    Service(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OpsError>;
