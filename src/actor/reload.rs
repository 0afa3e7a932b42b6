//! Reload Actor
//!
//! Owns the reload cycle: reload each changed module, rebuild every cached
//! view and broadcast the result. Messages are handled one at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{ReloadMsg, ReloadOutcome};
use crate::component::ComponentRegistry;
use crate::core::RebuildGuard;
use crate::logger::{error_chain, status_error, status_success, status_unchanged};
use crate::reload::clients::LiveClients;
use crate::reload::message::LiveMessage;
use crate::reload::{RebuildPolicy, ViewRebuilder, resolve_module_name};

pub struct ReloadActor {
    rx: mpsc::Receiver<ReloadMsg>,
    cycle: ReloadCycle,
}

impl ReloadActor {
    pub fn new(rx: mpsc::Receiver<ReloadMsg>, cycle: ReloadCycle) -> Self {
        Self { rx, cycle }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ReloadMsg::UpdateViews { paths, done } => {
                    let outcome = self.cycle.hot_replace(&paths);
                    if let Some(done) = done {
                        let _ = done.send(outcome);
                    }
                }
                ReloadMsg::Shutdown => break,
            }
        }
        crate::debug!("reload"; "actor stopped");
    }
}

/// One reload cycle, callable from any thread.
pub struct ReloadCycle {
    root: PathBuf,
    module_root: PathBuf,
    registry: Arc<ComponentRegistry>,
    rebuilder: ViewRebuilder,
    clients: Arc<LiveClients>,
    guard: RebuildGuard,
}

impl ReloadCycle {
    /// Changed paths arrive relative to `root`; module names are resolved
    /// against `module_root`.
    pub fn new(
        root: impl Into<PathBuf>,
        module_root: impl Into<PathBuf>,
        registry: Arc<ComponentRegistry>,
        policy: RebuildPolicy,
        clients: Arc<LiveClients>,
    ) -> Self {
        Self {
            root: root.into(),
            module_root: module_root.into(),
            rebuilder: ViewRebuilder::new(Arc::clone(&registry), policy),
            registry,
            clients,
            guard: RebuildGuard::new(),
        }
    }

    pub fn guard(&self) -> &RebuildGuard {
        &self.guard
    }

    /// Module name for a changed file.
    pub fn module_name(&self, path: &Path) -> String {
        let absolute = self.root.join(path);
        let relative = absolute.strip_prefix(&self.module_root).unwrap_or(path);
        resolve_module_name(relative)
    }

    /// Reload the modules behind `paths`, rebuild and broadcast.
    pub fn hot_replace(&self, paths: &[PathBuf]) -> ReloadOutcome {
        let Some(_ticket) = self.guard.try_begin() else {
            crate::log!("reload"; "update already in progress, dropping trigger");
            return ReloadOutcome::Busy;
        };

        for path in paths {
            let module = self.module_name(path);
            if let Err(e) = self.registry.modules().reload(&module) {
                let detail = error_chain(&e);
                status_error(&format!("failed to reload {}", path.display()), &detail);
                return ReloadOutcome::LoadFailed { module };
            }
        }

        let Some(views) = self.rebuilder.rebuild_all() else {
            status_unchanged("no data to update views with");
            return ReloadOutcome::NoViews;
        };

        let count = views.len();
        let clients = self.clients.broadcast(&LiveMessage::UpdateViews(views));
        status_success(&format!("updated {count} view(s) on {clients} client(s)"));
        ReloadOutcome::Pushed {
            views: count,
            clients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::component::Args;
    use crate::reload::clients::tests::RecordingClient;
    use crate::reload::{ModuleTable, TemplateLoader};
    use serde_json::{Value, json};
    use std::fs;
    use tokio::sync::oneshot;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        registry: Arc<ComponentRegistry>,
        clients: Arc<LiveClients>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(
            root.join("templates/views.toml"),
            "[greeting]\nparams = [\"name\"]\ntemplate = \"<p>Hello, {{ name }}!</p>\"",
        )
        .unwrap();

        let modules = Arc::new(ModuleTable::new(TemplateLoader::new(root.join("templates"))));
        let cache = Arc::new(CacheStore::new(root.join(".relax/components.json")));
        cache.reset().unwrap();
        let registry = Arc::new(ComponentRegistry::new(modules).with_cache(cache));
        Fixture {
            _dir: dir,
            root,
            registry,
            clients: Arc::new(LiveClients::new()),
        }
    }

    fn cycle(f: &Fixture) -> ReloadCycle {
        ReloadCycle::new(
            &f.root,
            f.root.join("templates"),
            f.registry.clone(),
            RebuildPolicy::AllOrNothing,
            f.clients.clone(),
        )
    }

    fn args(value: Value) -> Args {
        let Value::Object(map) = value else {
            unreachable!()
        };
        map
    }

    #[test]
    fn test_edit_pushes_new_markup() {
        let f = fixture();
        let (client, inbox) = RecordingClient::new();
        f.clients.register(Box::new(client));
        f.registry
            .render("views.greeting", args(json!({"name": "Ada"})))
            .unwrap();

        let file = f.root.join("templates/views.toml");
        fs::write(
            &file,
            "[greeting]\nparams = [\"name\"]\ntemplate = \"<p>Hi, {{ name }}!</p>\"",
        )
        .unwrap();

        let outcome = cycle(&f).hot_replace(&[file]);
        assert_eq!(
            outcome,
            ReloadOutcome::Pushed {
                views: 1,
                clients: 1
            }
        );

        let sent: Value = serde_json::from_str(&inbox.lock()[0]).unwrap();
        assert_eq!(
            sent,
            json!({
                "event_type": "update_views",
                "data": {
                    "greeting": "<div id=\"greeting\" class=\"greeting\"><p>Hi, Ada!</p></div>"
                }
            })
        );
    }

    #[test]
    fn test_load_failure_aborts_cycle() {
        let f = fixture();
        let (client, inbox) = RecordingClient::new();
        f.clients.register(Box::new(client));
        f.registry
            .render("views.greeting", args(json!({"name": "Ada"})))
            .unwrap();

        let file = f.root.join("templates/views.toml");
        fs::write(&file, "[greeting\n").unwrap();

        let outcome = cycle(&f).hot_replace(&[file]);
        assert_eq!(
            outcome,
            ReloadOutcome::LoadFailed {
                module: "views".into()
            }
        );
        assert!(inbox.lock().is_empty());
        // the previous module survives the failed reload
        assert!(f.registry.modules().get("views").is_some());
    }

    #[test]
    fn test_empty_cache_pushes_empty_update() {
        let f = fixture();
        let (client, inbox) = RecordingClient::new();
        f.clients.register(Box::new(client));

        let outcome = cycle(&f).hot_replace(&[PathBuf::from("templates/views.toml")]);
        assert_eq!(
            outcome,
            ReloadOutcome::Pushed {
                views: 0,
                clients: 1
            }
        );
        assert_eq!(
            inbox.lock()[0],
            r#"{"event_type":"update_views","data":{}}"#
        );
    }

    #[test]
    fn test_missing_cache_pushes_nothing() {
        let f = fixture();
        fs::remove_file(f.registry.cache().unwrap().path()).unwrap();
        let (client, inbox) = RecordingClient::new();
        f.clients.register(Box::new(client));

        let outcome = cycle(&f).hot_replace(&[PathBuf::from("templates/views.toml")]);
        assert_eq!(outcome, ReloadOutcome::NoViews);
        assert!(inbox.lock().is_empty());
    }

    #[test]
    fn test_concurrent_trigger_is_dropped() {
        let f = fixture();
        let cycle = cycle(&f);
        let _ticket = cycle.guard().try_begin().unwrap();
        assert_eq!(
            cycle.hot_replace(&[PathBuf::from("templates/views.toml")]),
            ReloadOutcome::Busy
        );
    }

    #[test]
    fn test_module_name() {
        let f = fixture();
        let cycle = cycle(&f);
        assert_eq!(
            cycle.module_name(&f.root.join("templates/pages/home.toml")),
            "pages.home"
        );
        assert_eq!(
            cycle.module_name(Path::new("templates/pages/mod.toml")),
            "pages"
        );
        assert_eq!(cycle.module_name(Path::new("views.toml")), "views");
    }

    #[tokio::test]
    async fn test_actor_replies_in_order() {
        let f = fixture();
        let (tx, rx) = mpsc::channel(4);
        let actor = ReloadActor::new(rx, cycle(&f));
        let handle = tokio::spawn(actor.run());

        let (done_tx, done_rx) = oneshot::channel();
        tx.send(ReloadMsg::UpdateViews {
            paths: vec![PathBuf::from("templates/views.toml")],
            done: Some(done_tx),
        })
        .await
        .unwrap();
        assert!(matches!(
            done_rx.await.unwrap(),
            ReloadOutcome::Pushed { .. }
        ));

        tx.send(ReloadMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
