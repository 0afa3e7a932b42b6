//! Typed HTML element tree.
//!
//! Components build an [`Element`] tree with a consuming builder API and
//! [`Element::render`] turns it into markup. The live reload pipeline only
//! ever needs the rendered string, element ids and the root class list.
//!
//! ```ignore
//! use relax::html::{self, Element};
//!
//! let page = html::div()
//!     .id("greeting")
//!     .classes(["card", "shadow"])
//!     .child(html::p().text("Hello, Ada!"));
//! assert_eq!(
//!     page.render(),
//!     r#"<div id="greeting" class="card shadow"><p>Hello, Ada!</p></div>"#
//! );
//! ```
//!
//! # Modules
//!
//! - `escape` - entity escaping, void element table
//! - `tags` - constructors for the supported tag set
//! - `htmx` - `hx-*` attribute helpers

mod escape;
mod htmx;
mod tags;

use std::fmt;

pub use escape::{escape, is_void_element};
pub use htmx::{HtmlError, HxOptions, HxSwap, HxTarget};
pub use tags::*;

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text content, escaped on render
    Text(String),
    /// Pre-rendered markup, emitted verbatim
    Raw(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// An HTML element with ordered attributes, classes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    children: Vec<Node>,
    doctype: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            classes: Vec::new(),
            children: Vec::new(),
            doctype: false,
        }
    }

    /// Tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.name)
    }

    /// Emit `<!DOCTYPE html>` before the element.
    pub(crate) fn with_doctype(mut self) -> Self {
        self.doctype = true;
        self
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    /// Set an attribute. Re-setting a key keeps its original position.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn attrs<K, V>(mut self, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in attrs {
            self.set_attr(key, value);
        }
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(self, value: impl Into<String>) -> Self {
        self.attr("id", value)
    }

    pub fn get_id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    // ------------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------------

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    pub fn classes<S: Into<String>>(mut self, classes: impl IntoIterator<Item = S>) -> Self {
        for class in classes {
            self.add_class(class);
        }
        self
    }

    /// Add a class unless it is already present.
    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.has_class(&class) {
            self.classes.push(class);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    // ------------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------------

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn raw(mut self, markup: impl Into<String>) -> Self {
        self.children.push(Node::Raw(markup.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<N: Into<Node>>(mut self, children: impl IntoIterator<Item = N>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Insert children, either appending or replacing the current ones.
    pub fn insert<N: Into<Node>>(
        mut self,
        children: impl IntoIterator<Item = Option<N>>,
        append: bool,
    ) -> Self {
        if !append {
            self.children.clear();
        }
        self.children
            .extend(children.into_iter().flatten().map(Into::into));
        self
    }

    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Render the element tree to markup.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(64);
        self.render_into(&mut out);
        out
    }

    pub fn render_into(&self, out: &mut String) {
        if self.doctype {
            out.push_str("<!DOCTYPE html>");
        }
        out.push('<');
        out.push_str(&self.name);
        self.render_attributes(out);

        if self.is_void() {
            out.push_str(" />");
            return;
        }

        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.render_into(out),
                Node::Text(text) => out.push_str(&escape(text)),
                Node::Raw(markup) => out.push_str(markup),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Attributes in insertion order, `class` last.
    fn render_attributes(&self, out: &mut String) {
        for (key, value) in &self.attributes {
            push_attribute(out, key, value.trim());
        }
        if !self.classes.is_empty() {
            push_attribute(out, "class", &self.classes.join(" "));
        }
    }
}

fn push_attribute(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
