//! Re-rendering cached views after a module reload.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::ComponentRecord;
use crate::component::{ComponentError, ComponentRegistry, split_path};

/// Element id -> freshly rendered markup.
pub type RenderedViews = BTreeMap<String, String>;

/// What to do when one cached entry fails to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildPolicy {
    /// Abandon the whole cycle; clients keep their current markup.
    #[default]
    AllOrNothing,
    /// Skip the failing entry and push the rest.
    PartialSuccess,
}

pub struct ViewRebuilder {
    registry: Arc<ComponentRegistry>,
    policy: RebuildPolicy,
}

impl ViewRebuilder {
    pub fn new(registry: Arc<ComponentRegistry>, policy: RebuildPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> RebuildPolicy {
        self.policy
    }

    /// Re-render every cached invocation.
    ///
    /// Entries whose component no longer exists are skipped. Returns
    /// `None` when the cache is unreadable, or, under
    /// [`RebuildPolicy::AllOrNothing`], when any entry fails.
    pub fn rebuild_all(&self) -> Option<RenderedViews> {
        let Some(cache) = self.registry.cache() else {
            crate::debug!("reload"; "no component cache configured");
            return None;
        };
        let Some(records) = cache.load_all() else {
            crate::debug!("reload"; "component cache unreadable");
            return None;
        };

        let mut views = RenderedViews::new();
        for (id, record) in records {
            match self.rebuild_entry(&record) {
                Ok(Some(markup)) => {
                    views.insert(id, markup);
                }
                Ok(None) => {
                    crate::debug!("reload"; "skipping {}: `{}` no longer exists", id, record.path);
                }
                Err(e) => match self.policy {
                    RebuildPolicy::AllOrNothing => {
                        crate::log!("reload"; "failed to rebuild {}: {}", id, e);
                        return None;
                    }
                    RebuildPolicy::PartialSuccess => {
                        crate::log!("reload"; "skipping {}: {}", id, e);
                    }
                },
            }
        }
        Some(views)
    }

    fn rebuild_entry(&self, record: &ComponentRecord) -> Result<Option<String>, ComponentError> {
        let (module_name, function) = split_path(&record.path)?;
        let module = self.registry.modules().get_or_load(module_name)?;
        let Some(component) = module.component(function) else {
            return Ok(None);
        };
        let (_, element) =
            self.registry
                .render_component(&record.path, &component, record.data.clone())?;
        Ok(Some(element.render()))
    }
}
