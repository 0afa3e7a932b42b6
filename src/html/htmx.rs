//! htmx attribute helpers.

use thiserror::Error;

use super::Element;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HtmlError {
    #[error("hx-target element <{0}> must have an id attribute")]
    TargetWithoutId(String),
}

/// `hx-swap` strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HxSwap {
    InnerHtml,
    OuterHtml,
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
    Delete,
    None,
}

impl HxSwap {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InnerHtml => "innerHTML",
            Self::OuterHtml => "outerHTML",
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
            Self::Delete => "delete",
            Self::None => "none",
        }
    }
}

/// What an htmx request swaps into.
#[derive(Debug, Clone, Copy)]
pub enum HxTarget<'a> {
    /// A raw CSS selector
    Selector(&'a str),
    /// Another element, addressed by its id
    Element(&'a Element),
}

#[derive(Debug, Clone, Default)]
pub struct HxOptions<'a> {
    /// Send as `multipart/form-data`
    pub multipart: bool,
    pub target: Option<HxTarget<'a>>,
    pub swap: Option<HxSwap>,
    /// Extra attributes; `_` in keys becomes `-` (`hx_confirm` -> `hx-confirm`)
    pub extra: Vec<(&'a str, &'a str)>,
}

impl Element {
    pub fn hx_get(self, url: &str, options: HxOptions<'_>) -> Result<Self, HtmlError> {
        self.htmx("get", url, options)
    }

    pub fn hx_post(self, url: &str, options: HxOptions<'_>) -> Result<Self, HtmlError> {
        self.htmx("post", url, options)
    }

    pub fn hx_put(self, url: &str, options: HxOptions<'_>) -> Result<Self, HtmlError> {
        self.htmx("put", url, options)
    }

    pub fn hx_delete(self, url: &str, options: HxOptions<'_>) -> Result<Self, HtmlError> {
        self.htmx("delete", url, options)
    }

    fn htmx(mut self, verb: &str, url: &str, options: HxOptions<'_>) -> Result<Self, HtmlError> {
        self.set_attr(format!("hx-{verb}"), url);
        if options.multipart {
            self.set_attr("hx-encoding", "multipart/form-data");
        }
        match options.target {
            Some(HxTarget::Selector(selector)) => self.set_attr("hx-target", selector),
            Some(HxTarget::Element(target)) => {
                let id = target
                    .get_id()
                    .ok_or_else(|| HtmlError::TargetWithoutId(target.name().to_string()))?;
                self.set_attr("hx-target", format!("#{id}"));
            }
            None => {}
        }
        if let Some(swap) = options.swap {
            self.set_attr("hx-swap", swap.as_str());
        }
        for (key, value) in options.extra {
            self.set_attr(key.replace('_', "-"), value);
        }
        Ok(self)
    }
}
