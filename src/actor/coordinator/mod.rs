//! Actor Coordinator - wires up the live reload actors
//!
//! ```text
//! in-process:  FsActor --ChangePlan--> route_plans --ReloadMsg--> ReloadActor
//! socket:      NotificationListener -------------ReloadMsg------> ReloadActor
//! ```

mod runtime;

use std::path::PathBuf;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::ReloadMsg;
use super::reload::{ReloadActor, ReloadCycle};
use crate::reload::classify::ChangeClassifier;

const CHANNEL_BUFFER: usize = 32;

/// Where change notifications come from.
pub enum ChangeSource {
    /// Watch `root` in this process
    Watcher {
        root: PathBuf,
        classifier: ChangeClassifier,
    },
    /// Listen on a unix socket for an external producer
    Socket(PathBuf),
}

pub struct Coordinator {
    cycle: ReloadCycle,
    source: ChangeSource,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(cycle: ReloadCycle, source: ChangeSource) -> Self {
        Self {
            cycle,
            source,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system until shutdown.
    pub async fn run(self) -> Result<()> {
        let (reload_tx, reload_rx) = mpsc::channel::<ReloadMsg>(CHANNEL_BUFFER);
        let reload_actor = ReloadActor::new(reload_rx, self.cycle);

        let producer = match self.source {
            ChangeSource::Watcher { root, classifier } => {
                let (plan_tx, plan_rx) = mpsc::channel(CHANNEL_BUFFER);
                let fs_actor = FsActor::new(root, classifier, plan_tx)
                    .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
                runtime::Producer::Watcher {
                    fs: fs_actor,
                    plan_rx,
                }
            }
            #[cfg(unix)]
            ChangeSource::Socket(path) => {
                let listener = crate::reload::channel::NotificationListener::bind(&path)
                    .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", path.display(), e))?;
                runtime::Producer::Socket(listener)
            }
            #[cfg(not(unix))]
            ChangeSource::Socket(_) => {
                return Err(crate::reload::channel::ChannelError::Unsupported.into());
            }
        };

        crate::debug!("actor"; "start");
        runtime::run_actors(reload_actor, producer, reload_tx, self.shutdown_rx).await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
