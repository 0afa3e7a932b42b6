//! `[app]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [app]
//! templates_dir = "templates"   # Live-reloadable module root
//! env = "dev"                   # dev | prod | test
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    Dev,
    Prod,
    Test,
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Directory holding template modules, relative to the project root.
    pub templates_dir: PathBuf,
    pub env: Env,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            env: Env::Dev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_app_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.app.templates_dir, PathBuf::from("templates"));
        assert_eq!(config.app.env, Env::Dev);
    }

    #[test]
    fn test_app_env() {
        let config = test_parse_config("[app]\nenv = \"prod\"\ntemplates_dir = \"views\"");
        assert_eq!(config.app.env, Env::Prod);
        assert_eq!(config.app.templates_dir, PathBuf::from("views"));
    }

    #[test]
    fn test_app_env_invalid() {
        let result: Result<crate::config::AppConfig, _> = toml::from_str("[app]\nenv = \"staging\"");
        assert!(result.is_err());
    }
}
