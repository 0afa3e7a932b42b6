//! Typed dependency injection.
//!
//! Dependencies are registered once per type and handed to rendering
//! functions through [`Context::inject`](super::Context::inject).

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InjectionError {
    #[error("injectable `{0}` already added")]
    DoubleInjection(&'static str),

    #[error("missing dependency `{type_name}` for parameter `{param}`")]
    MissingDependency {
        type_name: &'static str,
        param: String,
    },
}

type Dependency = Arc<dyn Any + Send + Sync>;

/// Registry of injectable values keyed by type.
#[derive(Default)]
pub struct Injector {
    deps: RwLock<FxHashMap<TypeId, Dependency>>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dependency. Each type can only be provided once.
    pub fn provide<T: Any + Send + Sync>(&self, value: T) -> Result<(), InjectionError> {
        self.provide_arc(Arc::new(value))
    }

    pub fn provide_arc<T: Any + Send + Sync>(&self, value: Arc<T>) -> Result<(), InjectionError> {
        let mut deps = self.deps.write();
        if deps.contains_key(&TypeId::of::<T>()) {
            return Err(InjectionError::DoubleInjection(type_name::<T>()));
        }
        deps.insert(TypeId::of::<T>(), value);
        Ok(())
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let dep = self.deps.read().get(&TypeId::of::<T>()).cloned()?;
        dep.downcast::<T>().ok()
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.deps.read().contains_key(&type_id)
    }

    pub fn clear(&self) {
        self.deps.write().clear();
    }
}
