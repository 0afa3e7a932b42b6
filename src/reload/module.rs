//! Module naming, loading and the loaded-module table.

use std::fs;
use std::io;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::component::Module;
use crate::component::template::{self, TEMPLATE_EXTENSION, TemplateError};

/// File names that stand for their parent directory's module.
const PACKAGE_MARKERS: &[&str] = &["mod", "__init__"];

/// Extensions stripped from the last path segment when naming a module.
const SOURCE_EXTENSIONS: &[&str] = &[TEMPLATE_EXTENSION, "rs"];

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module `{0}` not found")]
    NotFound(String),

    #[error("failed to read module `{name}` from `{path}`")]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load module `{name}` from `{path}`")]
    Template {
        name: String,
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
}

/// Map a source path to its dotted module name.
///
/// `pkg/sub/view.toml` -> `pkg.sub.view`, `pkg/sub/mod.toml` -> `pkg.sub`.
/// Already-dotted names come back unchanged.
pub fn resolve_module_name(path: &Path) -> String {
    let mut parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            PathComponent::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = parts.last_mut()
        && let Some((stem, ext)) = last.rsplit_once('.')
        && SOURCE_EXTENSIONS.contains(&ext)
    {
        *last = stem.to_string();
    }

    let mut name = parts.join(".");
    for marker in PACKAGE_MARKERS {
        if let Some(parent) = name.strip_suffix(&format!(".{marker}")) {
            name = parent.to_string();
            break;
        }
    }
    name
}

// ============================================================================
// Loaders
// ============================================================================

/// Produces a fresh [`Module`] for a dotted name.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<Module, ModuleError>;
}

/// Loads template modules from `root`, re-reading the file on every load.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    root: PathBuf,
}

impl TemplateLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files for `name`, in lookup order.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let base = name
            .split('.')
            .fold(self.root.clone(), |path, part| path.join(part));
        let mut candidates = vec![base.with_extension(TEMPLATE_EXTENSION)];
        for marker in PACKAGE_MARKERS {
            candidates.push(base.join(marker).with_extension(TEMPLATE_EXTENSION));
        }
        candidates
    }
}

impl ModuleLoader for TemplateLoader {
    fn load(&self, name: &str) -> Result<Module, ModuleError> {
        let Some(path) = self.candidates(name).into_iter().find(|p| p.is_file()) else {
            return Err(ModuleError::NotFound(name.to_string()));
        };
        let source = fs::read_to_string(&path).map_err(|source| ModuleError::Io {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;
        template::parse_module(name, &source).map_err(|source| ModuleError::Template {
            name: name.to_string(),
            path,
            source,
        })
    }
}

/// Tries each loader in turn, moving on only when a loader does not know
/// the module.
#[derive(Default)]
pub struct LoaderChain {
    loaders: Vec<Box<dyn ModuleLoader>>,
}

impl LoaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }
}

impl ModuleLoader for LoaderChain {
    fn load(&self, name: &str) -> Result<Module, ModuleError> {
        for loader in &self.loaders {
            match loader.load(name) {
                Err(ModuleError::NotFound(_)) => continue,
                result => return result,
            }
        }
        Err(ModuleError::NotFound(name.to_string()))
    }
}

// ============================================================================
// Module Table
// ============================================================================

/// Process-wide table of loaded modules.
///
/// A module is loaded on first use and replaced wholesale by [`reload`].
/// A failed reload leaves the previous module in place.
///
/// [`reload`]: ModuleTable::reload
pub struct ModuleTable {
    loader: Box<dyn ModuleLoader>,
    modules: DashMap<String, Arc<Module>>,
}

impl ModuleTable {
    pub fn new(loader: impl ModuleLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            modules: DashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.get(name).map(|m| Arc::clone(m.value()))
    }

    pub fn get_or_load(&self, name: &str) -> Result<Arc<Module>, ModuleError> {
        if let Some(module) = self.get(name) {
            return Ok(module);
        }
        let module = Arc::new(self.loader.load(name)?);
        crate::debug!("reload"; "loaded module {}", name);
        self.modules.insert(name.to_string(), Arc::clone(&module));
        Ok(module)
    }

    /// Load `name` again and swap it in.
    pub fn reload(&self, name: &str) -> Result<Arc<Module>, ModuleError> {
        let module = Arc::new(self.loader.load(name)?);
        crate::debug!("reload"; "reloaded module {} ({} components)", name, module.len());
        self.modules.insert(name.to_string(), Arc::clone(&module));
        Ok(module)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
