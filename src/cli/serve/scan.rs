//! Template module discovery.
//!
//! Every template file under `app.templates_dir` is loaded at startup so
//! broken templates surface immediately and the JS constants cover every
//! component class.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::component::template::TEMPLATE_EXTENSION;
use crate::config::AppConfig;
use crate::reload::classify::is_temp_file;
use crate::reload::{ModuleError, ModuleTable, resolve_module_name};

#[derive(Debug, Default)]
pub struct ScanReport {
    /// Module names loaded, sorted
    pub loaded: Vec<String>,
    pub failed: Vec<(PathBuf, ModuleError)>,
}

impl ScanReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Template files under `dir`, sorted.
pub fn collect_templates(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION) && !is_temp_file(p)
        })
        .collect();
    files.sort();
    files
}

/// Load every template module into `modules`.
pub fn load_templates(config: &AppConfig, modules: &ModuleTable) -> ScanReport {
    let mut report = ScanReport::default();

    for path in collect_templates(&config.app.templates_dir) {
        let name = resolve_module_name(&config.root_relative(&path));
        match modules.get_or_load(&name) {
            Ok(_) => report.loaded.push(name),
            Err(e) => report.failed.push((path, e)),
        }
    }

    report.loaded.sort();
    report.loaded.dedup();
    crate::debug!("scan"; "loaded {} template module(s)", report.loaded.len());
    report
}
