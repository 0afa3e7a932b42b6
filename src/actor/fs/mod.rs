//! FileSystem Actor
//!
//! Watches the project and sends a [`ChangePlan`] for every debounced batch
//! of changes.
//!
//! ```text
//! Watcher → Debouncer (timing) → ChangeClassifier → ChangePlan
//! ```

use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::reload::classify::{ChangeClassifier, ChangePlan};

// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;


use debouncer::Debouncer;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    classifier: ChangeClassifier,
    plan_tx: mpsc::Sender<ChangePlan>,
}

impl FsActor {
    /// Start watching `root` right away; events buffer until [`run`].
    ///
    /// [`run`]: FsActor::run
    pub fn new(
        root: PathBuf,
        classifier: ChangeClassifier,
        plan_tx: mpsc::Sender<ChangePlan>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        crate::debug!("watch"; "watching {}", root.display());

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            classifier,
            plan_tx,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let _watcher = self._watcher;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if process_changes(&mut debouncer, &self.classifier, &self.plan_tx)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            }
        }
    }
}

/// Returns `Err(())` once the receiver has gone away.
async fn process_changes(
    debouncer: &mut Debouncer,
    classifier: &ChangeClassifier,
    plan_tx: &mpsc::Sender<ChangePlan>,
) -> Result<(), ()> {
    let Some(changes) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let mut paths: Vec<PathBuf> = changes.into_keys().collect();
    paths.sort();
    let plan = classifier.classify(&paths);
    if plan.is_empty() {
        return Ok(());
    }

    for path in &plan.templates {
        crate::log!("watch"; "template changed: {}", path.display());
    }
    if plan.needs_restart() {
        crate::log!("watch"; "{} application file(s) changed", plan.app.len());
    }

    plan_tx.send(plan).await.map_err(|_| ())
}
