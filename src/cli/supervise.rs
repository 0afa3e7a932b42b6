//! `relax serve --supervise`: watch in a parent process, serve in a child.
//!
//! ```text
//! FsActor --ChangePlan--> supervisor ─┬─ app change      → respawn worker
//!                                     └─ template change → notification socket
//! ```
//!
//! The supervisor owns the component cache: it is reset once here, and
//! respawned workers keep recording into it.

use std::ffi::OsString;
use std::process::{Child, Command};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::cache::CacheStore;
use crate::cli::Cli;
use crate::cli::serve::classifier;
use crate::config::AppConfig;
use crate::core::{is_shutdown, register_shutdown_signal};
use crate::logger::{status_error, status_success};
use crate::reload::channel::NotificationSender;
use crate::reload::classify::ChangePlan;
use crate::reload::message::ChangeMessage;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long a worker gets to exit on its own before it is killed.
const STOP_GRACE: Duration = Duration::from_secs(2);

pub fn run(config: &Arc<AppConfig>, cli: &Cli) -> Result<()> {
    CacheStore::new(&config.reload.cache_file)
        .reset()
        .context("failed to reset component cache")?;

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded::<()>();
    register_shutdown_signal(shutdown_tx);

    let mut worker = Worker::new(worker_args(config, cli));
    worker.spawn()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let result = rt.block_on(supervise(config, &mut worker, shutdown_rx));
    worker.stop();
    result
}

async fn supervise(
    config: &AppConfig,
    worker: &mut Worker,
    shutdown_rx: Receiver<()>,
) -> Result<()> {
    let (plan_tx, mut plan_rx) = mpsc::channel::<ChangePlan>(32);
    let fs = FsActor::new(config.root.clone(), classifier(config), plan_tx)
        .context("failed to watch project")?;
    tokio::spawn(fs.run());

    let sender = Arc::new(NotificationSender::new(&config.reload.socket_path));
    log!("supervise"; "watching {}", config.root.display());

    loop {
        tokio::select! {
            plan = plan_rx.recv() => {
                let Some(plan) = plan else { break };
                handle_plan(config, plan, worker, &sender).await;
            }
            () = tokio::time::sleep(POLL_INTERVAL) => {
                if shutdown_rx.try_recv().is_ok() || is_shutdown() {
                    crate::debug!("supervise"; "shutdown signal received");
                    break;
                }
                worker.reap();
            }
        }
    }
    Ok(())
}

async fn handle_plan(
    config: &AppConfig,
    plan: ChangePlan,
    worker: &mut Worker,
    sender: &Arc<NotificationSender>,
) {
    // a fresh worker renders everything anyway
    if plan.needs_restart() {
        let names: Vec<_> = plan
            .app
            .iter()
            .map(|p| config.root_relative(p).display().to_string())
            .collect();
        log!("supervise"; "changed: {}, restarting", names.join(", "));
        worker.stop();
        if let Err(e) = worker.spawn() {
            status_error("failed to restart worker", &format!("{e:#}"));
        }
        return;
    }

    if plan.templates.is_empty() {
        return;
    }
    let message = ChangeMessage::update_views(plan.template_strings());
    let sender = Arc::clone(sender);
    let sent = tokio::task::spawn_blocking(move || sender.send(&message)).await;
    match sent {
        Ok(Ok(())) => status_success(&format!(
            "sent {} template change(s) to the server",
            plan.templates.len()
        )),
        Ok(Err(e)) => status_error("can't reach the reload socket, views not updated", &e.to_string()),
        Err(e) => status_error("notification task failed", &e.to_string()),
    }
}

/// Command line for the worker process.
fn worker_args(config: &AppConfig, cli: &Cli) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--color".into(),
        color_arg(cli.color).into(),
        "-C".into(),
        config.config_path.clone().into_os_string(),
        "serve".into(),
        "--worker".into(),
        "--interface".into(),
        config.serve.interface.to_string().into(),
        "--port".into(),
        config.serve.port.to_string().into(),
    ];
    if let Some(serve) = cli.serve_args()
        && let Some(reload) = serve.reload
    {
        args.push(format!("--reload={reload}").into());
    }
    if cli.verbose() {
        args.push("--verbose".into());
    }
    args
}

fn color_arg(choice: clap::ColorChoice) -> &'static str {
    match choice {
        clap::ColorChoice::Always => "always",
        clap::ColorChoice::Never => "never",
        clap::ColorChoice::Auto => "auto",
    }
}

/// The child `relax serve --worker` process.
struct Worker {
    args: Vec<OsString>,
    child: Option<Child>,
}

impl Worker {
    fn new(args: Vec<OsString>) -> Self {
        Self { args, child: None }
    }

    fn spawn(&mut self) -> Result<()> {
        let exe = std::env::current_exe().context("failed to locate relax executable")?;
        let child = Command::new(exe)
            .args(&self.args)
            .spawn()
            .context("failed to spawn worker")?;
        crate::debug!("supervise"; "worker started (pid {})", child.id());
        self.child = Some(child);
        Ok(())
    }

    /// Forget a worker that exited on its own.
    fn reap(&mut self) {
        if let Some(child) = &mut self.child
            && let Ok(Some(status)) = child.try_wait()
        {
            if !is_shutdown() {
                log!("supervise"; "worker exited ({}), waiting for changes", status);
            }
            self.child = None;
        }
    }

    /// Let the worker exit, killing it after the grace period.
    fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let deadline = std::time::Instant::now() + STOP_GRACE;
        // ctrl-c reaches the whole process group, so a shutting down worker
        // is already on its way out
        while is_shutdown() && std::time::Instant::now() < deadline {
            if let Ok(Some(_)) = child.try_wait() {
                return;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        let _ = child.kill();
        let _ = child.wait();
    }
}
