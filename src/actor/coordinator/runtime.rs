use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::{mpsc, oneshot};

use crate::actor::fs::FsActor;
use crate::actor::messages::ReloadMsg;
use crate::actor::reload::ReloadActor;
use crate::reload::classify::ChangePlan;

pub(super) enum Producer {
    Watcher {
        fs: FsActor,
        plan_rx: mpsc::Receiver<ChangePlan>,
    },
    #[cfg(unix)]
    Socket(crate::reload::channel::NotificationListener),
}

/// Run all actors concurrently.
pub(super) async fn run_actors(
    reload: ReloadActor,
    producer: Producer,
    reload_tx: mpsc::Sender<ReloadMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let reload_handle = tokio::spawn(reload.run());

    let producer_handle = match producer {
        Producer::Watcher { fs, plan_rx } => {
            tokio::spawn(fs.run());
            tokio::spawn(route_plans(plan_rx, reload_tx.clone()))
        }
        #[cfg(unix)]
        Producer::Socket(listener) => tokio::spawn(listener.run(reload_tx.clone())),
    };

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        let _ = producer_handle.await;
    }

    let _ = reload_tx.send(ReloadMsg::Shutdown).await;
    let _ = tokio::time::timeout(Duration::from_millis(500), reload_handle).await;
}

/// Turn watcher plans into reload cycles, one at a time.
async fn route_plans(mut plan_rx: mpsc::Receiver<ChangePlan>, reload_tx: mpsc::Sender<ReloadMsg>) {
    while let Some(plan) = plan_rx.recv().await {
        if plan.needs_restart() {
            crate::log!("watch"; "application files changed, restart relax to apply them");
        }
        if plan.templates.is_empty() {
            continue;
        }
        let (done_tx, done_rx) = oneshot::channel();
        let msg = ReloadMsg::UpdateViews {
            paths: plan.templates,
            done: Some(done_tx),
        };
        if reload_tx.send(msg).await.is_err() {
            break;
        }
        let _ = done_rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_route_plans_forwards_templates_only() {
        let (plan_tx, plan_rx) = mpsc::channel(4);
        let (reload_tx, mut reload_rx) = mpsc::channel(4);
        tokio::spawn(route_plans(plan_rx, reload_tx));

        plan_tx
            .send(ChangePlan {
                templates: vec![],
                app: vec![PathBuf::from("/app/src/main.rs")],
            })
            .await
            .unwrap();
        plan_tx
            .send(ChangePlan {
                templates: vec![PathBuf::from("templates/views.toml")],
                app: vec![],
            })
            .await
            .unwrap();

        match reload_rx.recv().await.unwrap() {
            ReloadMsg::UpdateViews { paths, done } => {
                assert_eq!(paths, vec![PathBuf::from("templates/views.toml")]);
                assert!(done.is_some());
            }
            ReloadMsg::Shutdown => panic!("unexpected shutdown"),
        }
    }
}
