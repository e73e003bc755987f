//! Run configuration, read from `pseudo.toml`

use crate::error::{Error, Result};
use crate::interp::TypePolicy;
use serde::Deserialize;
use std::path::Path;

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE: &str = "pseudo.toml";

/// Script file extension checked by `pseudo run`
pub const SCRIPT_EXTENSION: &str = "pseudo";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Reject writes whose value does not fit the declared type
    pub strict_types: bool,
    pub require_extension: bool,
    pub color: bool,
    /// Print the store as JSON once the script has run
    pub dump_state: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict_types: true,
            require_extension: true,
            color: true,
            dump_state: false,
        }
    }
}

impl Config {
    /// Load `path`, or `pseudo.toml` from the working directory if present.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE)),
            None => Ok(Config::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::parse(&text)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> std::result::Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn type_policy(&self) -> TypePolicy {
        if self.strict_types {
            TypePolicy::Strict
        } else {
            TypePolicy::Permissive
        }
    }

    /// Check a script path against `require_extension`.
    pub fn check_script_path(&self, path: &Path) -> Result<()> {
        if !self.require_extension
            || path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION)
        {
            return Ok(());
        }
        Err(Error::invalid_script(format!(
            "`{}` must have a .{SCRIPT_EXTENSION} extension",
            path.display()
        )))
    }
}
