//! Embedded static resources.
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{HOTRELOAD_JS, HotreloadVars};
//!
//! let js = HOTRELOAD_JS.render(&HotreloadVars { ws_port: 35729 });
//! let page = embed::inject_hotreload(page_html);
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Where the dev server exposes the live reload script.
    pub const HOTRELOAD_URL: &str = "/__relax/hotreload.js";

    /// Variables for hotreload.js.
    pub struct HotreloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HotreloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__RELAX_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live view update script with WebSocket port injection.
    pub const HOTRELOAD_JS: Template<HotreloadVars> =
        Template::new(include_str!("serve/hotreload.js"));
}

/// Inject the hotreload script tag before the last `</body>`, or append it.
pub fn inject_hotreload(content: &[u8]) -> Vec<u8> {
    let script = format!(r#"<script src="{}" defer></script>"#, serve::HOTRELOAD_URL);
    let script_bytes = script.as_bytes();

    // Byte pattern for </body> - most generators use lowercase
    const PATTERN: &[u8] = b"</body>";

    let mut result = Vec::with_capacity(content.len() + script_bytes.len());
    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(script_bytes);
        result.extend_from_slice(&content[pos..]);
    } else {
        // browsers handle a trailing script fine
        result.extend_from_slice(content);
        result.extend_from_slice(script_bytes);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotreload_js_with_vars() {
        let rendered = serve::HOTRELOAD_JS.render(&serve::HotreloadVars { ws_port: 35731 });
        assert!(rendered.contains("var PORT = 35731;"));
        assert!(rendered.contains("update_views"));
        assert!(!rendered.contains("__RELAX_WS_PORT__"));
    }

    #[test]
    fn test_inject_before_last_body() {
        let page = b"<html><body><p>x</p></BODY></html>";
        let out = String::from_utf8(inject_hotreload(page)).unwrap();
        assert_eq!(
            out,
            r#"<html><body><p>x</p><script src="/__relax/hotreload.js" defer></script></BODY></html>"#
        );
    }

    #[test]
    fn test_inject_without_body_appends() {
        let out = String::from_utf8(inject_hotreload(b"<div id=\"a\"></div>")).unwrap();
        assert!(out.starts_with("<div id=\"a\"></div><script"));
    }
}
