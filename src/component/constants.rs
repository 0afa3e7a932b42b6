//! Shared JS constants.
//!
//! Client scripts select component roots by class. The class names are
//! exported as a small ES module so scripts never hard-code them:
//!
//! ```js
//! export const CONSTANTS = {
//!   GREETING_CLASS: "greeting",
//! };
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JsConstants {
    entries: BTreeMap<String, String>,
}

impl JsConstants {
    pub fn from_class_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        let entries = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                let constant = format!("{}_CLASS", name.replace('-', "_").to_ascii_uppercase());
                (constant, name.to_string())
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("export const CONSTANTS = {\n");
        for (constant, value) in &self.entries {
            // serde_json gives a valid JS string literal
            let literal = serde_json::Value::String(value.clone()).to_string();
            out.push_str(&format!("  {constant}: {literal},\n"));
        }
        out.push_str("};\n");
        out
    }
}

/// Write the constants file. Returns `false` when the content is unchanged.
pub fn write_js_constants(path: &Path, constants: &JsConstants) -> io::Result<bool> {
    let content = constants.render();
    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let constants = JsConstants::from_class_names(["user-card", "greeting"]);
        assert_eq!(
            constants.render(),
            "export const CONSTANTS = {\n  GREETING_CLASS: \"greeting\",\n  USER_CARD_CLASS: \"user-card\",\n};\n"
        );
    }

    #[test]
    fn test_write_skips_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static/js/constants.js");
        let constants = JsConstants::from_class_names(["greeting"]);

        assert!(write_js_constants(&path, &constants).unwrap());
        assert!(!write_js_constants(&path, &constants).unwrap());

        let more = JsConstants::from_class_names(["greeting", "footer"]);
        assert!(write_js_constants(&path, &more).unwrap());
        assert!(fs::read_to_string(&path).unwrap().contains("FOOTER_CLASS"));
    }
}
