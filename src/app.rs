//! Application assembly.
//!
//! [`App`] collects what only Rust code can provide: native component
//! modules, injected dependencies, argument decoders and hand-written
//! routes. [`App::run`] then drives the CLI.
//!
//! ```ignore
//! App::new()
//!     .native("app.widgets", widgets::module)
//!     .provide(Database::connect()?)?
//!     .decoder::<User>("user")
//!     .route(Route::get("/health", |_| Ok(p().text("ok"))))
//!     .run()
//! ```

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::de::DeserializeOwned;

use crate::cache::CacheStore;
use crate::cli::{Cli, Commands};
use crate::component::{ArgDecoders, ComponentRegistry, InjectionError, Injector, Module, NativeModules};
use crate::config::AppConfig;
use crate::html::Element;
use crate::reload::{LoaderChain, ModuleTable, TemplateLoader};
use crate::router::{Route, Router};

#[derive(Default)]
pub struct App {
    natives: NativeModules,
    injector: Arc<Injector>,
    decoders: ArgDecoders,
    routes: Vec<Route>,
}

/// Everything a request needs, built once per process.
pub struct Services {
    pub registry: Arc<ComponentRegistry>,
    pub router: Router,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a Rust-coded module under `name`.
    pub fn native<F>(mut self, name: impl Into<String>, builder: F) -> Self
    where
        F: Fn() -> Module + Send + Sync + 'static,
    {
        self.natives.register(name, builder);
        self
    }

    /// Provide a dependency for injected component parameters.
    pub fn provide<T: Any + Send + Sync>(self, value: T) -> Result<Self, InjectionError> {
        self.injector.provide(value)?;
        Ok(self)
    }

    /// Decode structured arguments tagged `tag` into `T`.
    pub fn decoder<T>(mut self, tag: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.decoders.register::<T>(tag);
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Build the registry and router for `config`.
    ///
    /// Invocations are only recorded while live reload is on.
    pub fn into_services(self, config: &AppConfig) -> Result<Services> {
        // native modules shadow template files of the same name
        let loader = LoaderChain::new()
            .with(self.natives)
            .with(TemplateLoader::new(&config.root));
        let modules = Arc::new(ModuleTable::new(loader));

        let mut registry = ComponentRegistry::new(modules)
            .with_injector(self.injector)
            .with_decoders(self.decoders);
        if config.live_reload_enabled() {
            registry = registry.with_cache(Arc::new(CacheStore::new(&config.reload.cache_file)));
        }

        let mut router = Router::new();
        for page in &config.pages {
            router.add(Route::page(page))?;
        }
        for route in self.routes {
            router.add(route)?;
        }

        Ok(Services {
            registry: Arc::new(registry),
            router,
        })
    }

    /// Parse the command line and run the selected command.
    pub fn run(self) -> Result<()> {
        // before anything blocks
        crate::core::setup_shutdown_handler()?;
        let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
        self.run_with(cli)
    }

    pub fn run_with(self, cli: &'static Cli) -> Result<()> {
        set_color(cli);
        crate::logger::set_verbose(cli.verbose());

        let config = Arc::new(AppConfig::load(cli)?);
        match &cli.command {
            Commands::Serve { args } if args.supervise && !args.worker => {
                crate::cli::supervise::run(&config, cli)
            }
            Commands::Serve { args } => crate::cli::serve::run(self, config, args),
            Commands::Check { .. } => crate::cli::check::run(self, &config),
        }
    }
}

fn set_color(cli: &Cli) {
    match cli.color {
        clap::ColorChoice::Always => owo_colors::set_override(true),
        clap::ColorChoice::Never => owo_colors::set_override(false),
        clap::ColorChoice::Auto => {}
    }
}

/// Wrap a fragment in a minimal page; used when a route answers a full page
/// load with a bare component.
pub fn page_shell(title: &str, body: Element) -> Element {
    use crate::html::{body as body_tag, head, html, meta_charset, title as title_tag};
    html("en")
        .child(head().child(meta_charset("utf-8")).child(title_tag(title)))
        .child(body_tag().child(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, Param};
    use crate::html::p;
    use crate::router::{Method, Resolution};
    use serde_json::json;

    fn greeting_module() -> Module {
        Module::new("app.widgets").with(
            Component::new("greeting", |props, _cx| {
                let name = props
                    .str("name")
                    .ok_or_else(|| anyhow::anyhow!("missing name"))?;
                Ok(p().text(format!("Hello {name}")))
            })
            .param(Param::value("name")),
        )
    }

    fn config(dir: &std::path::Path, extra: &str) -> AppConfig {
        let mut config = AppConfig::from_str(extra).unwrap();
        config.finalize(dir);
        config
    }

    #[test]
    fn test_native_modules_resolve() {
        let dir = tempfile::TempDir::new().unwrap();
        let services = App::new()
            .native("app.widgets", greeting_module)
            .into_services(&config(dir.path(), ""))
            .unwrap();

        let args = json!({"name": "Ada"}).as_object().unwrap().clone();
        let element = services.registry.render("app.widgets.greeting", args).unwrap();
        assert_eq!(element.render(), r#"<p id="greeting" class="greeting">Hello Ada</p>"#);
    }

    #[test]
    fn test_no_cache_in_prod() {
        let dir = tempfile::TempDir::new().unwrap();
        let services = App::new()
            .into_services(&config(dir.path(), "[app]\nenv = \"prod\""))
            .unwrap();
        assert!(services.registry.cache().is_none());

        let services = App::new().into_services(&config(dir.path(), "")).unwrap();
        assert!(services.registry.cache().is_some());
    }

    #[test]
    fn test_pages_become_routes() {
        let dir = tempfile::TempDir::new().unwrap();
        let services = App::new()
            .native("app.widgets", greeting_module)
            .into_services(&config(
                dir.path(),
                "[[page]]\nroute = \"/hello/{name}\"\nname = \"hello\"\ncomponent = \"app.widgets.greeting\"",
            ))
            .unwrap();

        assert_eq!(
            services.router.url_for("hello", &[("name", "Ada")]).unwrap(),
            "/hello/Ada"
        );
        let Resolution::Found { handler, params } =
            services.router.resolve(Method::Get, "/hello/Grace")
        else {
            panic!("expected page route");
        };
        let mut req = crate::router::Request::new(
            Method::Get,
            "/hello/Grace",
            false,
            Arc::clone(&services.registry),
        );
        req.path_params = params;
        assert!(handler(&req).unwrap().render().contains("Hello Grace"));
    }

    #[test]
    fn test_double_provide_fails() {
        let result = App::new().provide(1u32).and_then(|app| app.provide(2u32));
        assert!(matches!(result, Err(InjectionError::DoubleInjection(_))));
    }
}
