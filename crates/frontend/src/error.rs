use thiserror::Error;

/// Result type for front-end operations
pub type Result<T> = std::result::Result<T, FrontendError>;

/// Errors raised while turning source files into facts
#[derive(Error, Debug)]
pub enum FrontendError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source could not be turned into facts
    #[error("Parse error in {path}: {reason}")]
    Parse { path: String, reason: String },

    /// Tree-sitter setup failed
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// File content is not UTF-8
    #[error("{path} is not valid UTF-8")]
    Utf8 { path: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FrontendError {
    /// Create a parse error
    pub fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }
}
