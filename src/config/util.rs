//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/app/templates/pages/  ← cwd
/// /home/user/app/relax.toml        ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

pub(super) fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

/// Expand `~` and anchor relative paths at `root`.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
    if expanded.is_relative() {
        root.join(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("templates/pages");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("relax.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("relax.toml")).unwrap();
        assert_eq!(found, dir.path().join("relax.toml"));
    }

    #[test]
    fn test_find_config_missing() {
        let dir = TempDir::new().unwrap();
        assert!(find_config_from(dir.path(), Path::new("no-such-relax.toml")).is_none());
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/srv/app");
        assert_eq!(
            resolve_path(Path::new(".relax/components.json"), root),
            PathBuf::from("/srv/app/.relax/components.json")
        );
        assert_eq!(
            resolve_path(Path::new("/tmp/sock"), root),
            PathBuf::from("/tmp/sock")
        );
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(
                resolve_path(Path::new("~/.cache/relax-reload"), root),
                Path::new(&home).join(".cache/relax-reload")
            );
        }
    }
}
