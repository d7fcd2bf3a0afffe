use std::path::PathBuf;

use crate::error::ConfigError;

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "ShaderDump";

/// Substring that marks the placeholder closing every name table.
pub const DEFAULT_SENTINEL: &str = "Add-your-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpConfig {
    /// Directory under which `<kind>/` sub-folders receive the artifacts.
    pub output_root: PathBuf,
    /// Overrides the sentinel marker declared by the catalogue, if set.
    pub sentinel: Option<String>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            sentinel: None,
        }
    }
}

impl DumpConfig {
    /// Reads `SHADER_DUMP_DIR` and `SHADER_DUMP_SENTINEL`, falling back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let output_root = match lookup("SHADER_DUMP_DIR") {
            Some(dir) if dir.trim().is_empty() => {
                return Err(ConfigError::InvalidEnv("SHADER_DUMP_DIR"))
            }
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(DEFAULT_OUTPUT_ROOT),
        };

        let sentinel = match lookup("SHADER_DUMP_SENTINEL") {
            Some(marker) if marker.is_empty() => {
                return Err(ConfigError::InvalidEnv("SHADER_DUMP_SENTINEL"))
            }
            other => other,
        };

        Ok(Self {
            output_root,
            sentinel,
        })
    }
}
