//! Components: named rendering functions grouped into modules.
//!
//! A [`Component`] produces an [`Element`] from its arguments. Rendering
//! goes through the [`ComponentRegistry`], which assigns the element id,
//! adds the component class and records the invocation in the cache so
//! the view can be rebuilt after its module is reloaded.
//!
//! # Module Structure
//!
//! ```text
//! component/
//! ├── mod.rs        # Component, Param, KeySpec, Module, Context
//! ├── id.rs         # Element id derivation
//! ├── props.rs      # Props (arguments as seen by render functions)
//! ├── inject.rs     # Typed dependency injection
//! ├── decode.rs     # Structured argument decoders
//! ├── registry.rs   # ComponentRegistry (render + cache recording)
//! ├── template.rs   # TOML template modules
//! ├── native.rs     # Modules built from Rust functions
//! └── constants.rs  # Shared JS constants file
//! ```

mod constants;
mod decode;
mod id;
mod inject;
mod native;
mod props;
mod registry;
pub mod template;

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::html::Element;

pub use constants::{JsConstants, write_js_constants};
pub use decode::ArgDecoders;
pub use id::{element_id, kebab};
pub use inject::{InjectionError, Injector};
pub use native::NativeModules;
pub use props::{Args, PropError, Props};
pub use registry::{ComponentError, ComponentRegistry, split_path};

/// Rendering function of a component.
pub type RenderFn = Arc<dyn Fn(&Props, &Context<'_>) -> anyhow::Result<Element> + Send + Sync>;

/// Key computation for [`KeySpec::Computed`].
pub type KeyFn = Arc<dyn Fn(&Props) -> Option<String> + Send + Sync>;

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Plain JSON value.
    Value,
    /// Object decoded through the [`ArgDecoders`] entry for `tag`.
    Structured { tag: String },
    /// Supplied by the [`Injector`], never cached.
    Injected {
        type_id: TypeId,
        type_name: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

impl Param {
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Value,
        }
    }

    pub fn structured(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Structured { tag: tag.into() },
        }
    }

    pub fn injected<T: Any + Send + Sync>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Injected {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
            },
        }
    }

    pub fn is_injected(&self) -> bool {
        matches!(self.kind, ParamKind::Injected { .. })
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParamKind::Value => write!(f, "{}", self.name),
            ParamKind::Structured { tag } => write!(f, "{}: {tag}", self.name),
            ParamKind::Injected { type_name, .. } => write!(f, "{}: {type_name}", self.name),
        }
    }
}

// ============================================================================
// Keys
// ============================================================================

/// How the key part of the element id is obtained.
#[derive(Clone, Default)]
pub enum KeySpec {
    #[default]
    None,
    Fixed(String),
    /// Argument values joined with `-`.
    Args(Vec<String>),
    Computed(KeyFn),
}

impl fmt::Debug for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Fixed(key) => f.debug_tuple("Fixed").field(key).finish(),
            Self::Args(args) => f.debug_tuple("Args").field(args).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// ============================================================================
// Component
// ============================================================================

#[derive(Clone)]
pub struct Component {
    name: String,
    params: Vec<Param>,
    key: KeySpec,
    render: RenderFn,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl Component {
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props, &Context<'_>) -> anyhow::Result<Element> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            key: KeySpec::None,
            render: Arc::new(render),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn key(mut self, key: KeySpec) -> Self {
        self.key = key;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_list(&self) -> &[Param] {
        &self.params
    }

    pub fn key_spec(&self) -> &KeySpec {
        &self.key
    }

    /// Class added to the component root: the kebab-case function name.
    pub fn class_name(&self) -> String {
        kebab(&self.name)
    }

    /// Human-readable call signature, stored alongside cached arguments.
    pub fn signature(&self) -> String {
        let (plain, injected): (Vec<_>, Vec<_>) =
            self.params.iter().partition(|p| !p.is_injected());
        let mut parts: Vec<String> = plain.iter().map(ToString::to_string).collect();
        if !injected.is_empty() {
            parts.push("*".into());
            parts.extend(injected.iter().map(ToString::to_string));
        }
        format!("{}({})", self.name, parts.join(", "))
    }

    pub(crate) fn call(&self, props: &Props, cx: &Context<'_>) -> anyhow::Result<Element> {
        (self.render)(props, cx)
    }
}

// ============================================================================
// Module
// ============================================================================

/// A named table of components, the unit of reloading.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    components: FxHashMap<String, Arc<Component>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: FxHashMap::default(),
        }
    }

    pub fn with(mut self, component: Component) -> Self {
        self.insert(component);
        self
    }

    pub fn insert(&mut self, component: Component) {
        self.components
            .insert(component.name.clone(), Arc::new(component));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self, function: &str) -> Option<Arc<Component>> {
        self.components.get(function).cloned()
    }

    pub fn components(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

// ============================================================================
// Render Context
// ============================================================================

/// Per-invocation context handed to render functions.
pub struct Context<'a> {
    id: &'a str,
    registry: &'a ComponentRegistry,
}

impl<'a> Context<'a> {
    pub(crate) fn new(id: &'a str, registry: &'a ComponentRegistry) -> Self {
        Self { id, registry }
    }

    /// Element id assigned to this invocation.
    pub fn id(&self) -> &str {
        self.id
    }

    pub fn inject<T: Any + Send + Sync>(&self) -> Result<Arc<T>, InjectionError> {
        self.registry
            .injector()
            .get::<T>()
            .ok_or(InjectionError::MissingDependency {
                type_name: type_name::<T>(),
                param: String::new(),
            })
    }

    /// Render a nested component. The child is cached like any other.
    pub fn render(&self, path: &str, args: Args) -> Result<Element, ComponentError> {
        self.registry.render(path, args)
    }
}
