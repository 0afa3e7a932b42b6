//! Element id derivation.
//!
//! A component's element id is its function name in kebab-case, suffixed
//! with `-<key>` when the invocation carries a key. The same logical
//! invocation always maps to the same id, so re-rendering overwrites the
//! previous cache slot instead of adding a new one.

/// `helper_component` -> `helper-component`
pub fn kebab(name: &str) -> String {
    name.trim_matches('_').replace('_', "-")
}

/// Derive the element id for a component invocation.
pub fn element_id(function: &str, key: Option<&str>) -> String {
    let base = kebab(function);
    match key {
        Some(key) if !key.is_empty() => format!("{base}-{key}"),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_function_name() {
        assert_eq!(element_id("helper_component", None), "helper-component");
    }

    #[test]
    fn test_id_with_key() {
        assert_eq!(
            element_id("helper_component_with_str_key", Some("key")),
            "helper-component-with-str-key-key"
        );
    }

    #[test]
    fn test_empty_key_is_ignored() {
        assert_eq!(element_id("greeting", Some("")), "greeting");
    }

    #[test]
    fn test_same_identity_same_id() {
        let a = element_id("row", Some("42"));
        let b = element_id("row", Some("42"));
        let c = element_id("row", Some("43"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
