//! Server lifecycle management.

use crate::{
    actor::{ChangeSource, Coordinator, reload::ReloadCycle},
    config::{AppConfig, ReloadMode},
    reload::classify::ChangeClassifier,
};
use anyhow::Result;
use crossbeam::channel::Receiver;
use std::{
    net::SocketAddr,
    thread::{self, JoinHandle},
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Where the reload actors get their change notifications.
pub fn change_source(config: &AppConfig) -> ChangeSource {
    match config.reload.mode {
        ReloadMode::Socket => ChangeSource::Socket(config.reload.socket_path.clone()),
        ReloadMode::InProcess => ChangeSource::Watcher {
            root: config.root.clone(),
            classifier: classifier(config),
        },
    }
}

/// Classifier that skips files the server writes itself.
pub fn classifier(config: &AppConfig) -> ChangeClassifier {
    let mut classifier = ChangeClassifier::new(&config.root, &config.app.templates_dir)
        .ignore(&config.reload.cache_file);
    if let Some(path) = &config.reload.js_constants {
        classifier = classifier.ignore(path);
    }
    classifier
}

/// Spawn the actor system for hot reload on its own runtime thread.
pub fn spawn_actors(
    cycle: ReloadCycle,
    source: ChangeSource,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log!("actor"; "failed to create tokio runtime: {}", e);
                return;
            }
        };

        rt.block_on(async {
            let coordinator = Coordinator::new(cycle, source).with_shutdown_signal(shutdown_rx);
            if let Err(e) = coordinator.run().await {
                log!("actor"; "error: {:#}", e);
            }
        });
    })
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::classify::FileCategory;
    use std::path::Path;

    #[test]
    fn test_bind_with_retry_skips_busy_port() {
        let localhost = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        let (_first, addr) = bind_with_retry(localhost, 0).unwrap();
        let (_second, next) = bind_with_retry(localhost, addr.port()).unwrap();
        assert_ne!(addr.port(), next.port());
    }

    #[test]
    fn test_change_source_follows_mode() {
        let mut config = AppConfig::from_str("[reload]\nmode = \"socket\"").unwrap();
        config.finalize(Path::new("/srv/app"));
        assert!(matches!(change_source(&config), ChangeSource::Socket(_)));

        config.reload.mode = ReloadMode::InProcess;
        assert!(matches!(change_source(&config), ChangeSource::Watcher { .. }));
    }

    #[test]
    fn test_classifier_ignores_generated_files() {
        let mut config =
            AppConfig::from_str("[reload]\njs_constants = \"static/constants.js\"").unwrap();
        config.finalize(Path::new("/srv/app"));
        let classifier = classifier(&config);

        assert_eq!(
            classifier.categorize(Path::new("/srv/app/static/constants.js")),
            FileCategory::Ignored
        );
        assert_eq!(
            classifier.categorize(Path::new("/srv/app/src/main.rs")),
            FileCategory::App
        );
    }
}
