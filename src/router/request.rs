//! Incoming request view handed to route handlers.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use rustc_hash::FxHashMap;

use super::Method;
use crate::component::{Args, ComponentError, ComponentRegistry};
use crate::html::Element;

pub struct Request {
    pub method: Method,
    /// Decoded path without the query string
    pub path: String,
    pub path_params: FxHashMap<String, String>,
    /// Decoded query pairs in request order
    pub query: Vec<(String, String)>,
    /// Sent by htmx (`HX-Request: true`)
    pub from_htmx: bool,
    registry: Arc<ComponentRegistry>,
}

impl Request {
    /// Split a raw request target into decoded path and query pairs.
    pub fn new(method: Method, url: &str, from_htmx: bool, registry: Arc<ComponentRegistry>) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        Self {
            method,
            path: decode(path),
            path_params: FxHashMap::default(),
            query: parse_query(query),
            from_htmx,
            registry,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// First query value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Render a component through the registry, recording it for live updates.
    pub fn render(&self, path: &str, args: Args) -> Result<Element, ComponentError> {
        self.registry.render(path, args)
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse `a=1&b=two+words`. Keys without `=` get an empty value.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(&k.replace('+', " ")), decode(&v.replace('+', " ")))
        })
        .collect()
}
