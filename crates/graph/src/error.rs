use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid facts for {path}: {reason}")]
    InvalidFacts { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl GraphError {
    pub fn invalid_facts(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFacts {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
