//! Constructors for the supported tag set.

use super::Element;

/// `type` attribute values for `<input>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    Email,
    Password,
    Number,
    Date,
    File,
    Hidden,
    Checkbox,
    Radio,
    Button,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Number => "number",
            Self::Date => "date",
            Self::File => "file",
            Self::Hidden => "hidden",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Button => "button",
        }
    }
}

/// `type` attribute values for `<button>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonType {
    #[default]
    Button,
    Submit,
    Reset,
}

impl ButtonType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Submit => "submit",
            Self::Reset => "reset",
        }
    }
}

/// `target` attribute values for `<a>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrefTarget {
    Blank,
    SelfFrame,
    Parent,
    Top,
}

impl HrefTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "_blank",
            Self::SelfFrame => "_self",
            Self::Parent => "_parent",
            Self::Top => "_top",
        }
    }
}

macro_rules! plain_tags {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("`<", stringify!($name), ">` element.")]
            pub fn $name() -> Element {
                Element::new(stringify!($name))
            }
        )*
    };
}

plain_tags!(
    div, main, nav, p, span, body, form, i, li, ul, ol, svg, path, textarea, progress, head,
    header, footer, section, table, tr, td, th, h1, h2, h3,
);

pub fn button(kind: ButtonType) -> Element {
    Element::new("button").attr("type", kind.as_str())
}

pub fn a(href: impl Into<String>, target: Option<HrefTarget>) -> Element {
    let el = Element::new("a").attr("href", href);
    match target {
        Some(target) => el.attr("target", target.as_str()),
        None => el,
    }
}

pub fn label(for_id: impl Into<String>) -> Element {
    Element::new("label").attr("for", for_id)
}

pub fn select(name: impl Into<String>) -> Element {
    Element::new("select").attr("name", name)
}

pub fn option(value: impl Into<String>) -> Element {
    Element::new("option").attr("value", value)
}

pub fn input(name: impl Into<String>, kind: InputType) -> Element {
    Element::new("input")
        .attr("name", name)
        .attr("type", kind.as_str())
}

pub fn img(src: impl Into<String>, alt: impl Into<String>) -> Element {
    Element::new("img").attr("alt", alt).attr("src", src)
}

pub fn meta_charset(charset: impl Into<String>) -> Element {
    Element::new("meta").attr("charset", charset)
}

pub fn meta(name: impl Into<String>, content: impl Into<String>) -> Element {
    Element::new("meta")
        .attr("name", name)
        .attr("content", content)
}

pub fn link(href: impl Into<String>, rel: impl Into<String>) -> Element {
    Element::new("link").attr("href", href).attr("rel", rel)
}

pub fn title(text: impl Into<String>) -> Element {
    Element::new("title").text(text)
}

/// Inline stylesheet. The CSS is emitted verbatim.
pub fn style(css: impl Into<String>) -> Element {
    Element::new("style").raw(css)
}

/// Inline script. The code is emitted verbatim.
pub fn script(js: impl Into<String>) -> Element {
    Element::new("script").raw(js)
}

pub fn script_src(src: impl Into<String>) -> Element {
    Element::new("script").attr("src", src)
}

/// Document root, rendered with a leading doctype.
pub fn html(lang: impl Into<String>) -> Element {
    Element::new("html").attr("lang", lang).with_doctype()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_type() {
        assert_eq!(
            button(ButtonType::default()).render(),
            r#"<button type="button"></button>"#
        );
        assert_eq!(
            button(ButtonType::Submit).text("Go").render(),
            r#"<button type="submit">Go</button>"#
        );
    }

    #[test]
    fn test_anchor_target() {
        assert_eq!(
            a("/docs", Some(HrefTarget::Blank)).text("docs").render(),
            r#"<a href="/docs" target="_blank">docs</a>"#
        );
        assert_eq!(a("/", None).render(), r#"<a href="/"></a>"#);
    }

    #[test]
    fn test_img_attribute_order() {
        assert_eq!(
            img("/a.png", "an image").class("w-full").render(),
            r#"<img alt="an image" src="/a.png" class="w-full" />"#
        );
    }

    #[test]
    fn test_document_doctype() {
        let doc = html("en").child(head().child(title("Home"))).child(body());
        assert_eq!(
            doc.render(),
            r#"<!DOCTYPE html><html lang="en"><head><title>Home</title></head><body></body></html>"#
        );
    }

    #[test]
    fn test_script_and_style_verbatim() {
        assert_eq!(
            script("if (a < b) {}").render(),
            "<script>if (a < b) {}</script>"
        );
        assert_eq!(style("p > a {}").render(), "<style>p > a {}</style>");
    }
}
