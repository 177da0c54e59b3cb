use anyhow::{Context, Result};
use relmap_frontend::FrontendConfig;
use relmap_graph::GraphConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of `relmap.toml`.
///
/// Graph tables (`[types]`, `[interfaces]`, `[calls]`, `[dot]`) sit at the
/// top level; scanner and parser knobs live under `[frontend]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub graph: GraphConfig,

    pub frontend: FrontendConfig,
}

impl AppConfig {
    /// Defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::parse(&raw).with_context(|| format!("Invalid {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.graph.validate()?;
        self.frontend.validate()?;
        Ok(())
    }
}
