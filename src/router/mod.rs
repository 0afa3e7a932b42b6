//! Request routing.
//!
//! Routes match a method and a path pattern whose `{name}` segments capture
//! one decoded path segment each. Named routes can be turned back into URLs
//! with [`Router::url_for`].
//!
//! ```ignore
//! let mut router = Router::new();
//! router.add(Route::get("/users/{name}", show_user).name("user"))?;
//! router.url_for("user", &[("name", "ada"), ("tab", "posts")])?; // /users/ada?tab=posts
//! ```

mod request;

pub use request::{Request, parse_query};

use std::fmt;
use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::component::Args;
use crate::config::PageConfig;
use crate::html::Element;

/// Characters left alone in an encoded path segment or query value.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub type Handler = Arc<dyn Fn(&Request) -> anyhow::Result<Element> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// HEAD is answered like GET.
    pub fn from_http(method: &tiny_http::Method) -> Option<Self> {
        match method {
            tiny_http::Method::Get | tiny_http::Method::Head => Some(Self::Get),
            tiny_http::Method::Post => Some(Self::Post),
            tiny_http::Method::Put => Some(Self::Put),
            tiny_http::Method::Patch => Some(Self::Patch),
            tiny_http::Method::Delete => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("no route named `{0}`")]
    UnknownRoute(String),

    #[error("missing path parameter `{param}` for route `{route}`")]
    MissingParam { route: String, param: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

pub struct Route {
    method: Method,
    pattern: String,
    name: Option<String>,
    handler: Handler,
}

impl Route {
    pub fn new<F>(method: Method, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> anyhow::Result<Element> + Send + Sync + 'static,
    {
        Self {
            method,
            pattern: pattern.into(),
            name: None,
            handler: Arc::new(handler),
        }
    }

    pub fn get<F>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> anyhow::Result<Element> + Send + Sync + 'static,
    {
        Self::new(Method::Get, pattern, handler)
    }

    pub fn post<F>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> anyhow::Result<Element> + Send + Sync + 'static,
    {
        Self::new(Method::Post, pattern, handler)
    }

    /// Name the route for [`Router::url_for`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Route that renders `page.component` with its args plus path params.
    pub fn page(page: &PageConfig) -> Self {
        let component = page.component.clone();
        let args = page.args.clone();
        let route = Self::get(page.route.clone(), move |req: &Request| {
            let mut args: Args = args.clone();
            for (key, value) in &req.path_params {
                args.insert(key.clone(), value.clone().into());
            }
            Ok(req.render(&component, args)?)
        });
        match &page.name {
            Some(name) => route.name(name.clone()),
            None => route,
        }
    }
}

struct CompiledRoute {
    method: Method,
    segments: Vec<Segment>,
    handler: Handler,
}

/// Result of matching a request against the table.
pub enum Resolution {
    Found {
        handler: Handler,
        params: FxHashMap<String, String>,
    },
    /// The path exists under another method
    MethodNotAllowed,
    NotFound,
}

#[derive(Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
    names: FxHashMap<String, Vec<Segment>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: Route) -> Result<(), RouteError> {
        let segments = parse_pattern(&route.pattern)?;
        if let Some(name) = route.name {
            if self.names.contains_key(&name) {
                return Err(RouteError::DuplicateName(name));
            }
            self.names.insert(name, segments.clone());
        }
        self.routes.push(CompiledRoute {
            method: route.method,
            segments,
            handler: route.handler,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First registered route wins.
    pub fn resolve(&self, method: Method, path: &str) -> Resolution {
        let parts = split_path(path);
        let mut path_matched = false;

        for route in &self.routes {
            let Some(params) = match_segments(&route.segments, &parts) else {
                continue;
            };
            if route.method != method {
                path_matched = true;
                continue;
            }
            return Resolution::Found {
                handler: Arc::clone(&route.handler),
                params,
            };
        }

        if path_matched {
            Resolution::MethodNotAllowed
        } else {
            Resolution::NotFound
        }
    }

    /// Build the URL of a named route.
    ///
    /// Params matching `{name}` segments fill the path; the rest become an
    /// encoded query string in the order given.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let segments = self
            .names
            .get(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;

        let mut url = String::new();
        let mut used = Vec::new();
        for segment in segments {
            url.push('/');
            match segment {
                Segment::Literal(s) => url.push_str(s),
                Segment::Param(p) => {
                    let value = params
                        .iter()
                        .find(|(k, _)| *k == p.as_str())
                        .map(|(_, v)| *v)
                        .ok_or_else(|| RouteError::MissingParam {
                            route: name.to_string(),
                            param: p.clone(),
                        })?;
                    url.extend(utf8_percent_encode(value, COMPONENT));
                    used.push(p.as_str());
                }
            }
        }
        if url.is_empty() {
            url.push('/');
        }

        let query: Vec<String> = params
            .iter()
            .filter(|(k, _)| !used.contains(k))
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, COMPONENT),
                    utf8_percent_encode(v, COMPONENT)
                )
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Ok(url)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    let invalid = |reason| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };
    if !pattern.starts_with('/') {
        return Err(invalid("must start with `/`"));
    }

    let mut seen = Vec::new();
    split_path(pattern)
        .into_iter()
        .map(|part| match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            Some("") => Err(invalid("empty parameter name")),
            Some(name) if seen.contains(&name) => Err(invalid("repeated parameter")),
            Some(name) => {
                seen.push(name);
                Ok(Segment::Param(name.to_string()))
            }
            None if part.contains(['{', '}']) => Err(invalid("unbalanced braces")),
            None => Ok(Segment::Literal(part.to_string())),
        })
        .collect()
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> Option<FxHashMap<String, String>> {
    if segments.len() != parts.len() {
        return None;
    }
    let mut params = FxHashMap::default();
    for (segment, part) in segments.iter().zip(parts) {
        match segment {
            Segment::Literal(s) if s == part => {}
            Segment::Literal(_) => return None,
            Segment::Param(name) => {
                params.insert(name.clone(), (*part).to_string());
            }
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::p;

    fn ok(_: &Request) -> anyhow::Result<Element> {
        Ok(p().text("ok"))
    }

    fn router() -> Router {
        let mut router = Router::new();
        router.add(Route::get("/", ok).name("home")).unwrap();
        router
            .add(Route::get("/users/{name}", ok).name("user"))
            .unwrap();
        router.add(Route::post("/users/{name}", ok)).unwrap();
        router
    }

    #[test]
    fn test_resolve_captures_params() {
        let Resolution::Found { params, .. } = router().resolve(Method::Get, "/users/ada/") else {
            panic!("expected a match");
        };
        assert_eq!(params.get("name").map(String::as_str), Some("ada"));
    }

    #[test]
    fn test_resolve_method_not_allowed() {
        assert!(matches!(
            router().resolve(Method::Delete, "/users/ada"),
            Resolution::MethodNotAllowed
        ));
        assert!(matches!(
            router().resolve(Method::Get, "/nope"),
            Resolution::NotFound
        ));
    }

    #[test]
    fn test_url_for() {
        let router = router();
        assert_eq!(router.url_for("home", &[]).unwrap(), "/");
        assert_eq!(
            router
                .url_for("user", &[("name", "ada lovelace"), ("tab", "a&b"), ("q", "<x>")])
                .unwrap(),
            "/users/ada%20lovelace?tab=a%26b&q=%3Cx%3E"
        );
    }

    #[test]
    fn test_url_for_errors() {
        let router = router();
        assert_eq!(
            router.url_for("user", &[("tab", "x")]),
            Err(RouteError::MissingParam {
                route: "user".into(),
                param: "name".into()
            })
        );
        assert_eq!(
            router.url_for("missing", &[]),
            Err(RouteError::UnknownRoute("missing".into()))
        );
    }

    #[test]
    fn test_duplicate_name() {
        let mut router = router();
        assert_eq!(
            router.add(Route::get("/again", ok).name("home")),
            Err(RouteError::DuplicateName("home".into()))
        );
    }

    #[test]
    fn test_invalid_patterns() {
        let mut router = Router::new();
        assert!(router.add(Route::get("users", ok)).is_err());
        assert!(router.add(Route::get("/a/{}", ok)).is_err());
        assert!(router.add(Route::get("/a/{x}/{x}", ok)).is_err());
        assert!(router.add(Route::get("/a/{x", ok)).is_err());
        assert!(router.is_empty());
    }
}
