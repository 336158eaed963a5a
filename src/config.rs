use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use livelog_types::{StreamSettings, Theme};

/// On-disk configuration; every section and field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stream: StreamSettings,
    pub theme: Theme,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
