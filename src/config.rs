use std::fs;
use std::path::{Path, PathBuf};

use kubemap_graph::GroupBy;
use serde::Deserialize;
use thiserror::Error;

use crate::render::OutputFormat;

/// Read from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "kubemap.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, toml::de::Error),
}

/// Defaults for command-line flags. Flags given explicitly always win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub group_by: Option<GroupBy>,
    pub expand_all: bool,
    pub format: Option<OutputFormat>,
    pub namespaces: Vec<String>,
    pub exclude_kinds: Vec<String>,
}

impl Config {
    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError(path.clone(), e))?;
        Self::from_toml(&content).map_err(|e| ConfigError::ParseError(path, e))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `--expand-all`/`--no-expand-all` when given, the file setting otherwise.
    pub fn expand_all_or(&self, flag: Option<bool>) -> bool {
        flag.unwrap_or(self.expand_all)
    }
}
