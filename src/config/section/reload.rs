//! `[reload]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [reload]
//! enabled = true                     # Forced off when app.env = "prod"
//! mode = "in-process"                # in-process | socket
//! socket_path = "~/.cache/relax-reload"
//! cache_file = ".relax/components.json"
//! rebuild_policy = "all-or-nothing"  # all-or-nothing | partial-success
//! js_constants = "static/js/constants.js"
//! ```
//!
//! `mode = "socket"` makes the server listen for change notifications from an
//! external producer (`relax serve --supervise` is one) instead of watching
//! the template directory itself.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_FILE;
use crate::reload::RebuildPolicy;

/// Where change notifications come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReloadMode {
    /// The server watches files itself.
    #[default]
    InProcess,
    /// Notifications arrive over a unix socket.
    Socket,
}

/// Live reload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    pub enabled: bool,
    pub mode: ReloadMode,
    /// Notification socket path. `~` is expanded.
    pub socket_path: PathBuf,
    /// Component cache file, relative to the project root.
    pub cache_file: PathBuf,
    pub rebuild_policy: RebuildPolicy,
    /// Where to write the component class constants module, if anywhere.
    pub js_constants: Option<PathBuf>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ReloadMode::InProcess,
            socket_path: PathBuf::from("~/.cache/relax-reload"),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            rebuild_policy: RebuildPolicy::default(),
            js_constants: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_reload_defaults() {
        let config = test_parse_config("");
        assert!(config.reload.enabled);
        assert_eq!(config.reload.mode, ReloadMode::InProcess);
        assert_eq!(config.reload.rebuild_policy, RebuildPolicy::AllOrNothing);
        assert_eq!(config.reload.cache_file, PathBuf::from(".relax/components.json"));
        assert!(config.reload.js_constants.is_none());
    }

    #[test]
    fn test_reload_kebab_case_values() {
        let config = test_parse_config(
            "[reload]\nmode = \"socket\"\nrebuild_policy = \"partial-success\"\njs_constants = \"static/constants.js\"",
        );
        assert_eq!(config.reload.mode, ReloadMode::Socket);
        assert_eq!(config.reload.rebuild_policy, RebuildPolicy::PartialSuccess);
        assert_eq!(
            config.reload.js_constants,
            Some(PathBuf::from("static/constants.js"))
        );
    }
}
