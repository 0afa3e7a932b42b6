//! Development server with live view updates.
//!
//! Startup order:
//!
//! ```text
//! reset cache → load templates → JS constants → WebSocket server
//!   → reload actors → HTTP request loop
//! ```
//!
//! A worker spawned by `relax serve --supervise` skips the cache reset (the
//! supervisor owns it) and always listens on the notification socket.

mod lifecycle;
mod response;
pub mod scan;

pub use lifecycle::{bind_with_retry, classifier};

use crate::{
    actor::reload::ReloadCycle,
    app::{App, Services, page_shell},
    cli::ServeArgs,
    component::{JsConstants, write_js_constants},
    config::AppConfig,
    core::register_server,
    logger::error_chain,
    reload::{clients::LiveClients, server::start_ws_server},
    router::{Method, Request as RouteRequest, Resolution},
};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Request handling threads
const POOL_THREADS: usize = 4;

/// Shared, read-only state of the request loop.
struct ServeContext {
    services: Services,
    /// WebSocket port when live reload is on
    ws_port: Option<u16>,
}

/// Run `relax serve` (or the supervised worker).
pub fn run(app: App, config: Arc<AppConfig>, args: &ServeArgs) -> Result<()> {
    let live = config.live_reload_enabled();
    let services = app.into_services(&config)?;

    if live
        && !args.worker
        && let Some(cache) = services.registry.cache()
    {
        cache.reset().context("failed to reset component cache")?;
    }

    let report = scan::load_templates(&config, services.registry.modules());
    for (path, e) in &report.failed {
        log!("error"; "{}: {}", config.root_relative(path).display(), e);
        let detail = error_chain(e);
        if !detail.is_empty() {
            eprintln!("{detail}");
        }
    }

    if let Some(path) = &config.reload.js_constants {
        let constants = JsConstants::from_class_names(services.registry.class_names());
        match write_js_constants(path, &constants) {
            Ok(true) => debug!("serve"; "wrote {} constant(s) to {}", constants.len(), path.display()),
            Ok(false) => {}
            Err(e) => log!("serve"; "failed to write {}: {}", path.display(), e),
        }
    }

    let clients = Arc::new(LiveClients::new());
    let ws_port = if live {
        let port = start_ws_server(config.serve.interface, config.serve.ws_port, Arc::clone(&clients))?;
        debug!("hotreload"; "ws://{}:{}", config.serve.interface, port);
        Some(port)
    } else {
        None
    };

    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_server(Arc::clone(&server), shutdown_tx);

    let actor_handle = live.then(|| {
        let cycle = ReloadCycle::new(
            &config.root,
            &config.root,
            Arc::clone(&services.registry),
            config.reload.rebuild_policy,
            clients,
        );
        lifecycle::spawn_actors(cycle, lifecycle::change_source(&config), shutdown_rx)
    });

    log!("serve"; "http://{}", addr);

    let ctx = Arc::new(ServeContext { services, ws_port });
    run_request_loop(&server, &ctx)?;
    lifecycle::wait_for_shutdown(actor_handle);
    Ok(())
}

fn run_request_loop(server: &Server, ctx: &Arc<ServeContext>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(POOL_THREADS)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(ctx);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let url = request.url().to_string();
    if let Some(port) = ctx.ws_port
        && url == crate::embed::serve::HOTRELOAD_URL
    {
        return response::respond_hotreload_js(request, port);
    }

    let Some(method) = Method::from_http(request.method()) else {
        return response::respond_method_not_allowed(request);
    };
    let from_htmx = request.headers().iter().any(|h| {
        h.field.equiv("HX-Request") && h.value.as_str().eq_ignore_ascii_case("true")
    });

    let mut route_request =
        RouteRequest::new(method, &url, from_htmx, Arc::clone(&ctx.services.registry));
    let live = ctx.ws_port.is_some();

    match ctx.services.router.resolve(method, &route_request.path) {
        Resolution::Found { handler, params } => {
            route_request.path_params = params;
            match handler(&route_request) {
                Ok(element) => {
                    // full page loads need a body to carry the live script
                    let element = if from_htmx || element.name() == "html" {
                        element
                    } else {
                        page_shell(&route_request.path, element)
                    };
                    response::respond_html(request, 200, element.render(), live && !from_htmx)
                }
                Err(e) => {
                    log!("serve"; "{} {}: {:#}", method, route_request.path, e);
                    response::respond_render_error(request, &e, live)
                }
            }
        }
        Resolution::MethodNotAllowed => response::respond_method_not_allowed(request),
        Resolution::NotFound => response::respond_not_found(request),
    }
}
