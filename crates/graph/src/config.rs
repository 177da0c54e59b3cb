use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};

/// Configuration of the merge pass and the DOT writer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub types: TypeResolverConfig,
    pub interfaces: InterfaceResolverConfig,
    pub calls: CallResolverConfig,
    pub dot: DotConfig,
}

impl GraphConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.dot.default_depth == 0 {
            return Err(GraphError::InvalidConfig(
                "dot.default_depth must be > 0".to_string(),
            ));
        }

        if let Some(bad) = self
            .types
            .extra_builtins
            .iter()
            .find(|name| name.is_empty() || name.chars().any(char::is_whitespace))
        {
            return Err(GraphError::InvalidConfig(format!(
                "types.extra_builtins contains an invalid type name: {bad:?}"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeResolverConfig {
    /// Additional names treated like builtins (never matched as field targets)
    pub extra_builtins: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceResolverConfig {
    /// Let interfaces without methods match every receiver
    pub match_empty_interfaces: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallResolverConfig {
    /// Accept a program-wide unique name when no restriction matched
    pub unique_name_fallback: bool,
}

impl Default for CallResolverConfig {
    fn default() -> Self {
        Self {
            unique_name_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotConfig {
    /// Emit `[style="dotted"]` on call edges found by the unique-name fallback
    pub mark_fallback_edges: bool,

    /// Depth used by callers that do not pass one explicitly
    pub default_depth: usize,

    /// When non-empty, draws only reach symbols declared in these packages
    /// (the start symbol is always drawn)
    pub focus_packages: Vec<String>,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            mark_fallback_edges: false,
            default_depth: 3,
            focus_packages: Vec::new(),
        }
    }
}
