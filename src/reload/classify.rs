//! Change classification.
//!
//! Pure functions deciding what a batch of changed files means: template
//! edits become a live view update, anything else in the project needs
//! the application restarted.

use std::path::{Path, PathBuf};

use crate::component::template::TEMPLATE_EXTENSION;

/// Directories under the project root that never trigger anything.
const IGNORED_DIRS: &[&str] = &[".relax", "target", "node_modules"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCategory {
    /// Template module under the templates directory
    Template,
    /// Application source or config
    App,
    Ignored,
}

/// What to do about a batch of changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangePlan {
    /// Template files to push, relative to the project root
    pub templates: Vec<PathBuf>,
    /// Application files that require a restart
    pub app: Vec<PathBuf>,
}

impl ChangePlan {
    pub fn needs_restart(&self) -> bool {
        !self.app.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty() && self.app.is_empty()
    }

    /// Template paths as wire strings.
    pub fn template_strings(&self) -> Vec<String> {
        self.templates
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ChangeClassifier {
    root: PathBuf,
    templates_dir: PathBuf,
    ignored: Vec<PathBuf>,
}

impl ChangeClassifier {
    pub fn new(root: impl Into<PathBuf>, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            templates_dir: templates_dir.into(),
            ignored: Vec::new(),
        }
    }

    /// Never react to `path` (generated files such as the JS constants).
    pub fn ignore(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignored.push(path.into());
        self
    }

    pub fn categorize(&self, path: &Path) -> FileCategory {
        if is_temp_file(path) || self.ignored.iter().any(|p| path.starts_with(p)) {
            return FileCategory::Ignored;
        }
        if path.starts_with(&self.templates_dir) {
            return match path.extension().and_then(|e| e.to_str()) {
                Some(TEMPLATE_EXTENSION) => FileCategory::Template,
                _ => FileCategory::Ignored,
            };
        }
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return FileCategory::Ignored;
        };
        let hidden_or_ignored = relative.components().any(|c| {
            let part = c.as_os_str().to_string_lossy();
            part.starts_with('.') || IGNORED_DIRS.contains(&part.as_ref())
        });
        if hidden_or_ignored {
            FileCategory::Ignored
        } else {
            FileCategory::App
        }
    }

    pub fn classify(&self, paths: &[PathBuf]) -> ChangePlan {
        let mut plan = ChangePlan::default();
        for path in paths {
            match self.categorize(path) {
                FileCategory::Template => {
                    // deleted templates have nothing left to reload
                    if !path.exists() {
                        continue;
                    }
                    let relative = path.strip_prefix(&self.root).unwrap_or(path);
                    plan.templates.push(relative.to_path_buf());
                }
                FileCategory::App => plan.app.push(path.clone()),
                FileCategory::Ignored => {}
            }
        }
        plan.templates.sort();
        plan.templates.dedup();
        plan
    }
}

/// Editor swap/backup files and similar noise.
pub fn is_temp_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    name.starts_with(".#")
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".swx")
        || name.ends_with(".tmp")
        || name == "4913"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn classifier(root: &Path) -> ChangeClassifier {
        ChangeClassifier::new(root, root.join("templates"))
            .ignore(root.join("static/js/constants.js"))
    }

    #[test]
    fn test_categorize() {
        let root = Path::new("/app");
        let c = classifier(root);
        assert_eq!(c.categorize(&root.join("templates/views.toml")), FileCategory::Template);
        assert_eq!(c.categorize(&root.join("templates/logo.svg")), FileCategory::Ignored);
        assert_eq!(c.categorize(&root.join("src/main.rs")), FileCategory::App);
        assert_eq!(c.categorize(&root.join("relax.toml")), FileCategory::App);
        assert_eq!(c.categorize(&root.join("target/debug/relax")), FileCategory::Ignored);
        assert_eq!(c.categorize(&root.join(".relax/components.json")), FileCategory::Ignored);
        assert_eq!(c.categorize(&root.join(".git/index")), FileCategory::Ignored);
        assert_eq!(c.categorize(&root.join("static/js/constants.js")), FileCategory::Ignored);
        assert_eq!(c.categorize(&root.join("templates/views.toml~")), FileCategory::Ignored);
        assert_eq!(c.categorize(Path::new("/elsewhere/file.rs")), FileCategory::Ignored);
    }

    #[test]
    fn test_classify_relative_template_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("templates/pages")).unwrap();
        fs::write(root.join("templates/pages/home.toml"), "").unwrap();

        let plan = classifier(root).classify(&[
            root.join("templates/pages/home.toml"),
            root.join("templates/pages/home.toml"),
            root.join("templates/gone.toml"),
        ]);
        assert_eq!(plan.templates, vec![PathBuf::from("templates/pages/home.toml")]);
        assert_eq!(plan.template_strings(), vec!["templates/pages/home.toml".to_string()]);
        assert!(!plan.needs_restart());
    }

    #[test]
    fn test_classify_app_change() {
        let root = Path::new("/app");
        let plan = classifier(root).classify(&[root.join("src/lib.rs")]);
        assert!(plan.needs_restart());
        assert!(plan.templates.is_empty());
    }

    #[test]
    fn test_temp_files() {
        assert!(is_temp_file(Path::new("a/.#views.toml")));
        assert!(is_temp_file(Path::new("a/views.toml.swp")));
        assert!(is_temp_file(Path::new("a/4913")));
        assert!(!is_temp_file(Path::new("a/views.toml")));
    }
}
