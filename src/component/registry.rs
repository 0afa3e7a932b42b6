//! Component rendering and invocation recording.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::{
    ArgDecoders, Args, Component, Context, InjectionError, Injector, KeySpec, ParamKind, Props,
    element_id,
};
use crate::cache::{CacheStore, ComponentRecord};
use crate::html::Element;
use crate::reload::{ModuleError, ModuleTable};

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("invalid component path `{0}`, expected `module.function`")]
    InvalidPath(String),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("component `{function}` not found in module `{module}`")]
    NotFound { module: String, function: String },

    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error("key argument `{arg}` missing for component `{component}`")]
    KeyArgument { component: String, arg: String },

    #[error("component `{path}` failed to render: {cause:#}")]
    Render { path: String, cause: anyhow::Error },
}

/// Split `module.path.function` at the last dot.
pub fn split_path(path: &str) -> Result<(&str, &str), ComponentError> {
    match path.rsplit_once('.') {
        Some((module, function)) if !module.is_empty() && !function.is_empty() => {
            Ok((module, function))
        }
        _ => Err(ComponentError::InvalidPath(path.to_string())),
    }
}

/// Renders components and records each invocation in the cache store.
pub struct ComponentRegistry {
    modules: Arc<ModuleTable>,
    cache: Option<Arc<CacheStore>>,
    injector: Arc<Injector>,
    decoders: Arc<ArgDecoders>,
}

impl ComponentRegistry {
    pub fn new(modules: Arc<ModuleTable>) -> Self {
        Self {
            modules,
            cache: None,
            injector: Arc::new(Injector::new()),
            decoders: Arc::new(ArgDecoders::new()),
        }
    }

    /// Record invocations into `cache`. Without a cache nothing is recorded.
    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_injector(mut self, injector: Arc<Injector>) -> Self {
        self.injector = injector;
        self
    }

    pub fn with_decoders(mut self, decoders: ArgDecoders) -> Self {
        self.decoders = Arc::new(decoders);
        self
    }

    pub fn modules(&self) -> &Arc<ModuleTable> {
        &self.modules
    }

    pub fn cache(&self) -> Option<&Arc<CacheStore>> {
        self.cache.as_ref()
    }

    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    /// Render the component at `path` (`module.function`).
    pub fn render(&self, path: &str, args: Args) -> Result<Element, ComponentError> {
        let component = self.lookup(path)?;
        let (_, element) = self.render_component(path, &component, args)?;
        Ok(element)
    }

    pub fn lookup(&self, path: &str) -> Result<Arc<Component>, ComponentError> {
        let (module_name, function) = split_path(path)?;
        let module = self.modules.get_or_load(module_name)?;
        module
            .component(function)
            .ok_or_else(|| ComponentError::NotFound {
                module: module_name.to_string(),
                function: function.to_string(),
            })
    }

    /// Render an already resolved component and record the invocation.
    ///
    /// Returns the element id together with the element.
    pub fn render_component(
        &self,
        path: &str,
        component: &Component,
        mut args: Args,
    ) -> Result<(String, Element), ComponentError> {
        for param in component.param_list() {
            if let ParamKind::Injected { type_id, type_name } = &param.kind {
                // injected values never travel through the cache
                args.remove(&param.name);
                if !self.injector.contains(*type_id) {
                    return Err(InjectionError::MissingDependency {
                        type_name: *type_name,
                        param: param.name.clone(),
                    }
                    .into());
                }
            }
        }

        let props = Props::decode(args, component.param_list(), &self.decoders);
        let key = component_key(component, &props)?;
        let id = element_id(component.name(), key.as_deref());

        let cx = Context::new(&id, self);
        let mut element = component
            .call(&props, &cx)
            .map_err(|cause| ComponentError::Render {
                path: path.to_string(),
                cause,
            })?;
        element.set_attr("id", &id);
        element.add_class(&component.class_name());

        if let Some(cache) = &self.cache {
            let record = ComponentRecord {
                path: path.to_string(),
                data: props.into_values(),
                signature: component.signature(),
            };
            if let Err(e) = cache.record(&id, record) {
                crate::log!("cache"; "failed to record `{}`: {}", id, e);
            }
        }

        Ok((id, element))
    }

    /// Class names of every component in the loaded modules.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .modules
            .names()
            .iter()
            .filter_map(|name| self.modules.get(name))
            .flat_map(|module| {
                module
                    .components()
                    .map(|c| c.class_name())
                    .collect::<Vec<_>>()
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn component_key(component: &Component, props: &Props) -> Result<Option<String>, ComponentError> {
    match component.key_spec() {
        KeySpec::None => Ok(None),
        KeySpec::Fixed(key) => Ok(Some(key.clone())),
        KeySpec::Computed(compute) => Ok(compute(props)),
        KeySpec::Args(names) => {
            let mut parts = Vec::with_capacity(names.len());
            for name in names {
                let value = props
                    .raw(name)
                    .ok_or_else(|| ComponentError::KeyArgument {
                        component: component.name().to_string(),
                        arg: name.clone(),
                    })?;
                parts.push(key_part(value));
            }
            Ok(Some(parts.join("-")))
        }
    }
}

fn key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
