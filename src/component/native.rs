//! Modules assembled from Rust functions.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::Module;
use crate::reload::{ModuleError, ModuleLoader};

type ModuleBuilder = Arc<dyn Fn() -> Module + Send + Sync>;

/// Loader for modules registered in code.
///
/// Reloading re-runs the builder. Code changes to native modules need a
/// process restart, which the supervisor takes care of.
#[derive(Default, Clone)]
pub struct NativeModules {
    builders: FxHashMap<String, ModuleBuilder>,
}

impl NativeModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn() -> Module + Send + Sync + 'static,
    {
        self.builders.insert(name.into(), Arc::new(builder));
    }

    /// Register a prebuilt module under its own name.
    pub fn register_module(&mut self, module: Module) {
        let name = module.name().to_string();
        self.register(name, move || module.clone());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}

impl ModuleLoader for NativeModules {
    fn load(&self, name: &str) -> Result<Module, ModuleError> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        let mut module = builder();
        if module.name() != name {
            module = rename(module, name);
        }
        Ok(module)
    }
}

fn rename(module: Module, name: &str) -> Module {
    let mut renamed = Module::new(name);
    for component in module.components() {
        renamed.insert(component.as_ref().clone());
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::html::div;

    #[test]
    fn test_load_registered_module() {
        let mut native = NativeModules::new();
        native.register("widgets", || {
            Module::new("anything").with(Component::new("card", |_, _| Ok(div())))
        });

        let module = native.load("widgets").unwrap();
        assert_eq!(module.name(), "widgets");
        assert!(module.component("card").is_some());
        assert_eq!(native.names().collect::<Vec<_>>(), vec!["widgets"]);
    }

    #[test]
    fn test_unknown_module() {
        let native = NativeModules::new();
        assert!(matches!(native.load("nope"), Err(ModuleError::NotFound(_))));
    }
}
