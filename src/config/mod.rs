//! Application configuration management for `relax.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── app        # [app]
//! │   ├── serve      # [serve]
//! │   ├── reload     # [reload]
//! │   └── page       # [[page]]
//! ├── types/         # ConfigError, diagnostics
//! └── mod.rs         # AppConfig (this file)
//! ```
//!
//! The project root is the directory holding `relax.toml`. Every relative
//! path in the file is anchored there once loading finishes.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_path};

pub use section::{AppSection, Env, PageConfig, ReloadConfig, ReloadMode, ServeConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};

use crate::cli::{Cli, ServeArgs};
use anyhow::Result;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing relax.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub app: AppSection,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Live reload settings
    #[serde(default)]
    pub reload: ReloadConfig,

    #[serde(rename = "page", default)]
    pub pages: Vec<PageConfig>,
}

impl AppConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            return Err(ConfigError::NotFound(cli.config.clone()).into());
        };

        let mut config = Self::from_path(&config_path)?;
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;
        config.finalize(&root);

        if let Some(args) = cli.serve_args() {
            config.apply_serve_args(args);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Anchor every configured path at `root`.
    pub fn finalize(&mut self, root: &Path) {
        // notify reports canonical paths, so the root must be canonical too
        let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

        self.app.templates_dir = resolve_path(&self.app.templates_dir, &root);
        self.reload.cache_file = resolve_path(&self.reload.cache_file, &root);
        self.reload.socket_path = resolve_path(&self.reload.socket_path, &root);
        if let Some(path) = self.reload.js_constants.take() {
            self.reload.js_constants = Some(resolve_path(&path, &root));
        }
        self.root = root;
    }

    /// Apply `relax serve` flags over file values.
    pub fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.reload.enabled, args.reload.as_ref());
        // the supervisor is the only producer a worker listens to
        if args.worker {
            self.reload.mode = ReloadMode::Socket;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Live reload never runs in production.
    pub fn live_reload_enabled(&self) -> bool {
        self.reload.enabled && self.app.env != Env::Prod
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        let mut names = FxHashSet::default();

        for (i, page) in self.pages.iter().enumerate() {
            if !page.route.starts_with('/') {
                diag.error(format!("page[{i}].route"), "route must start with `/`");
            }
            if crate::component::split_path(&page.component).is_err() {
                diag.error_with_hint(
                    format!("page[{i}].component"),
                    format!("`{}` is not a component path", page.component),
                    "use `module.function`, e.g. `templates.pages.home`",
                );
            }
            if let Some(name) = &page.name
                && !names.insert(name.as_str())
            {
                diag.error(format!("page[{i}].name"), format!("duplicate page name `{name}`"));
            }
        }

        if !self.app.templates_dir.starts_with(&self.root) {
            diag.error(
                "app.templates_dir",
                "templates directory must be inside the project root",
            );
        }

        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> AppConfig {
    let (parsed, ignored) = AppConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_from_str_invalid_toml() {
        let result = AppConfig::from_str("[app\ntemplates_dir = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 9000\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = AppConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 9000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let (_, ignored) =
            AppConfig::parse_with_ignored("[app]\nenv = \"test\"\n[reload]\nenabled = false")
                .unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_finalize_anchors_paths() {
        let mut config = test_parse_config("[reload]\njs_constants = \"static/constants.js\"");
        config.finalize(Path::new("/srv/app"));

        assert_eq!(config.root, PathBuf::from("/srv/app"));
        assert_eq!(config.app.templates_dir, PathBuf::from("/srv/app/templates"));
        assert_eq!(
            config.reload.cache_file,
            PathBuf::from("/srv/app/.relax/components.json")
        );
        assert_eq!(
            config.reload.js_constants,
            Some(PathBuf::from("/srv/app/static/constants.js"))
        );
        assert_eq!(
            config.root_relative("/srv/app/templates/views.toml"),
            PathBuf::from("templates/views.toml")
        );
    }

    #[test]
    fn test_serve_args_override() {
        let mut config = test_parse_config("[serve]\nport = 3000");
        config.apply_serve_args(&ServeArgs {
            interface: Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            reload: Some(false),
            worker: true,
            ..ServeArgs::default()
        });

        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(!config.reload.enabled);
        assert_eq!(config.reload.mode, ReloadMode::Socket);
    }

    #[test]
    fn test_live_reload_forced_off_in_prod() {
        let config = test_parse_config("[app]\nenv = \"prod\"");
        assert!(config.reload.enabled);
        assert!(!config.live_reload_enabled());

        let config = test_parse_config("[app]\nenv = \"test\"");
        assert!(config.live_reload_enabled());
    }

    #[test]
    fn test_validate_pages() {
        let mut config = test_parse_config(
            r#"
[[page]]
route = "home"
name = "home"
component = "home"

[[page]]
route = "/again"
name = "home"
component = "templates.pages.home"
"#,
        );
        config.finalize(Path::new("/srv/app"));

        let Err(ConfigError::Diagnostics(diag)) = config.validate() else {
            panic!("expected diagnostics");
        };
        let fields: Vec<_> = diag.errors().iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, ["page[0].route", "page[0].component", "page[1].name"]);
    }

    #[test]
    fn test_validate_ok() {
        let mut config = test_parse_config(
            "[[page]]\nroute = \"/\"\ncomponent = \"templates.pages.home\"",
        );
        config.finalize(Path::new("/srv/app"));
        assert!(config.validate().is_ok());
    }
}
