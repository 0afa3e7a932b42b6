//! Template modules.
//!
//! A template module is a TOML file whose top-level tables declare
//! components:
//!
//! ```toml
//! [greeting]
//! tag = "section"              # root element, defaults to "div"
//! params = ["name", "user:user"]  # `name:tag` marks a structured param
//! key = ["name"]               # optional, args joined into the id key
//! classes = ["card"]
//! template = "<p>Hello, {{ name }}!</p>"
//!
//! [greeting.defaults]
//! name = "world"
//! ```
//!
//! Placeholders are `{{ name }}`, `{{ name.field }}` (object keys or array
//! indices) and `{{ name | raw }}` for unescaped output. `{{ id }}` expands
//! to the element id unless a parameter of that name exists. Every
//! placeholder is checked against the declared parameters when the file is
//! parsed, so a typo fails the reload rather than the render.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{Args, Component, Context, KeySpec, Module, Param, Props};
use crate::html::{Element, escape};

/// File extension of template modules.
pub const TEMPLATE_EXTENSION: &str = "toml";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*(\|\s*raw\s*)?\}\}")
        .expect("valid placeholder regex")
});

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid template module")]
    Parse(#[from] toml::de::Error),

    #[error("component `{component}` uses undeclared parameter `{param}`")]
    UnknownParam { component: String, param: String },

    #[error("component `{component}` has no value for `{name}`")]
    MissingValue { component: String, name: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentDef {
    #[serde(default = "default_tag")]
    tag: String,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    key: Vec<String>,
    #[serde(default)]
    classes: Vec<String>,
    #[serde(default)]
    defaults: Map<String, Value>,
    template: String,
}

fn default_tag() -> String {
    "div".into()
}

#[derive(Debug, PartialEq)]
enum Segment {
    Literal(String),
    Value { path: Vec<String>, raw: bool },
}

#[derive(Debug)]
struct CompiledTemplate {
    component: String,
    tag: String,
    classes: Vec<String>,
    defaults: Args,
    segments: Vec<Segment>,
}

/// Parse the text of a template module into a [`Module`].
pub fn parse_module(name: &str, source: &str) -> Result<Module, TemplateError> {
    let defs: BTreeMap<String, ComponentDef> = toml::from_str(source)?;
    let mut module = Module::new(name);
    for (function, def) in defs {
        module.insert(build_component(function, def)?);
    }
    Ok(module)
}

fn build_component(function: String, def: ComponentDef) -> Result<Component, TemplateError> {
    let params: Vec<Param> = def
        .params
        .iter()
        .map(|spec| match spec.split_once(':') {
            Some((name, tag)) => Param::structured(name.trim(), tag.trim()),
            None => Param::value(spec.trim()),
        })
        .collect();

    let segments = compile(&def.template);
    for segment in &segments {
        let Segment::Value { path, .. } = segment else {
            continue;
        };
        let root = path[0].as_str();
        let declared = params.iter().any(|p| p.name == root) || def.defaults.contains_key(root);
        if !declared && root != "id" {
            return Err(TemplateError::UnknownParam {
                component: function,
                param: root.to_string(),
            });
        }
    }
    for key in &def.key {
        if !params.iter().any(|p| &p.name == key) {
            return Err(TemplateError::UnknownParam {
                component: function,
                param: key.clone(),
            });
        }
    }

    let key = if def.key.is_empty() {
        KeySpec::None
    } else {
        KeySpec::Args(def.key)
    };
    let template = Arc::new(CompiledTemplate {
        component: function.clone(),
        tag: def.tag,
        classes: def.classes,
        defaults: def.defaults,
        segments,
    });

    Ok(Component::new(function, move |props, cx| {
        Ok(template.render(props, cx)?)
    })
    .params(params)
    .key(key))
}

fn compile(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Literal(template[last..whole.start()].to_string()));
        }
        segments.push(Segment::Value {
            path: caps[1].split('.').map(str::to_string).collect(),
            raw: caps.get(2).is_some(),
        });
        last = whole.end();
    }
    if last < template.len() {
        segments.push(Segment::Literal(template[last..].to_string()));
    }
    segments
}

impl CompiledTemplate {
    fn render(&self, props: &Props, cx: &Context<'_>) -> Result<Element, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Value { path, raw } => {
                    let text = self.lookup(path, props, cx)?;
                    if *raw {
                        out.push_str(&text);
                    } else {
                        out.push_str(&escape(&text));
                    }
                }
            }
        }
        Ok(Element::new(&self.tag)
            .classes(self.classes.iter().cloned())
            .raw(out))
    }

    fn lookup(&self, path: &[String], props: &Props, cx: &Context<'_>) -> Result<String, TemplateError> {
        let root = path[0].as_str();
        let value = props.raw(root).or_else(|| self.defaults.get(root));
        let Some(mut value) = value else {
            if root == "id" && path.len() == 1 {
                return Ok(cx.id().to_string());
            }
            return Err(self.missing(path));
        };
        for part in &path[1..] {
            let next = match value {
                Value::Object(map) => map.get(part),
                Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            value = next.ok_or_else(|| self.missing(path))?;
        }
        Ok(display_value(value))
    }

    fn missing(&self, path: &[String]) -> TemplateError {
        TemplateError::MissingValue {
            component: self.component.clone(),
            name: path.join("."),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
