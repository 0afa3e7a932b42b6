//! `[[page]]` entries: routes that render a single component.
//!
//! ```toml
//! [[page]]
//! route = "/users/{name}"
//! name = "user"
//! component = "templates.pages.user"
//! args = { title = "User" }
//! ```
//!
//! Path parameters are merged into `args` before rendering, overriding
//! same-named entries.

use serde::{Deserialize, Serialize};

use crate::component::Args;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageConfig {
    pub route: String,
    /// Route name for `url_for`.
    #[serde(default)]
    pub name: Option<String>,
    /// Dotted component path, `module.function`.
    pub component: String,
    #[serde(default)]
    pub args: Args,
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_pages() {
        let config = test_parse_config(
            r#"
[[page]]
route = "/"
name = "home"
component = "templates.pages.home"
args = { title = "Home" }

[[page]]
route = "/about"
component = "templates.pages.about"
"#,
        );
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.pages[0].name.as_deref(), Some("home"));
        assert_eq!(config.pages[0].args["title"], "Home");
        assert!(config.pages[1].args.is_empty());
    }

    #[test]
    fn test_page_requires_component() {
        let result: Result<crate::config::AppConfig, _> =
            toml::from_str("[[page]]\nroute = \"/\"");
        assert!(result.is_err());
    }
}
