//! `relax check`: load every template module and report problems.

use anyhow::{Result, bail};

use crate::app::App;
use crate::cli::serve::scan::load_templates;
use crate::config::AppConfig;
use crate::logger::error_chain;

pub fn run(app: App, config: &AppConfig) -> Result<()> {
    let services = app.into_services(config)?;
    let report = load_templates(config, services.registry.modules());

    for name in &report.loaded {
        crate::debug!("check"; "ok {}", name);
    }
    for (path, e) in &report.failed {
        log!("error"; "{}: {}", config.root_relative(path).display(), e);
        let detail = error_chain(e);
        if !detail.is_empty() {
            eprintln!("{detail}");
        }
    }

    // pages must point at components that exist
    let mut missing = 0;
    for page in &config.pages {
        if let Err(e) = services.registry.lookup(&page.component) {
            log!("error"; "page `{}`: {}", page.route, e);
            missing += 1;
        }
    }

    if !report.is_ok() || missing > 0 {
        bail!(
            "{} template error(s), {} broken page(s)",
            report.failed.len(),
            missing
        );
    }
    log!("check"; "{} module(s) ok", report.loaded.len());
    Ok(())
}
