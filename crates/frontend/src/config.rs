use crate::error::{FrontendError, Result};
use serde::{Deserialize, Serialize};

/// Source discovery and parsing knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Directory names never descended into
    pub skip_dirs: Vec<String>,

    /// File name suffixes of generated or test sources
    pub skip_suffixes: Vec<String>,

    /// Maximum directory depth below the root
    pub max_depth: usize,

    /// Files above this size are skipped
    pub max_file_bytes: u64,

    /// Fail a file whose syntax tree contains error nodes
    pub reject_syntax_errors: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            skip_dirs: vec!["vendor".to_string()],
            skip_suffixes: vec![".pb.go".to_string(), "_test.go".to_string()],
            max_depth: 100,
            max_file_bytes: 1_048_576, // 1 MB
            reject_syntax_errors: true,
        }
    }
}

impl FrontendConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(FrontendError::InvalidConfig(
                "max_depth must be > 0".to_string(),
            ));
        }

        if self.max_file_bytes == 0 {
            return Err(FrontendError::InvalidConfig(
                "max_file_bytes must be > 0".to_string(),
            ));
        }

        if self.skip_suffixes.iter().any(String::is_empty) {
            return Err(FrontendError::InvalidConfig(
                "skip_suffixes must not contain empty entries".to_string(),
            ));
        }

        Ok(())
    }
}
