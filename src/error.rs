use std::io;

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum OrchestratorError {
    /// Raised by an extra service hook, or synthesized by the parallel
    /// runner from an unrecognized node-level failure. The key is a stable
    /// identifier used for log correlation.
    #[error("Service error [{key}]: {description}")]
    Service { key: String, description: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provisioning error: {0}")]
    Provision(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("YAML error: {0}")]
    Yaml(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

impl OrchestratorError {
    pub fn service(key: impl Into<String>, description: impl Into<String>) -> Self {
        OrchestratorError::Service {
            key: key.into(),
            description: description.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        OrchestratorError::Transport(msg.into())
    }

    pub fn provision(msg: impl Into<String>) -> Self {
        OrchestratorError::Provision(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        OrchestratorError::Config(msg.into())
    }

    /// Stable error key, present only for service errors.
    pub fn key(&self) -> Option<&str> {
        match self {
            OrchestratorError::Service { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<io::Error> for OrchestratorError {
    fn from(e: io::Error) -> Self {
        OrchestratorError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(e: serde_json::Error) -> Self {
        OrchestratorError::Json(e.to_string())
    }
}

impl From<serde_yaml::Error> for OrchestratorError {
    fn from(e: serde_yaml::Error) -> Self {
        OrchestratorError::Yaml(e.to_string())
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(e: reqwest::Error) -> Self {
        OrchestratorError::Transport(e.to_string())
    }
}
