//! relax - typed HTML builder and component toolkit.
//!
//! Components render [`html::Element`] trees. In development every rendered
//! component is recorded with its arguments; when a template module changes
//! the recorded calls are replayed and the fresh markup is pushed to every
//! connected browser.
//!
//! | Module      | Purpose                                              |
//! |-------------|------------------------------------------------------|
//! | `html`      | Element tree builder and renderer                    |
//! | `component` | Components, registry, injection, template modules    |
//! | `cache`     | Persistent record of rendered components             |
//! | `reload`    | Module reloading, view rebuild, live client protocol |
//! | `actor`     | Watcher and reload actors                            |
//! | `router`    | Routes, `url_for`, request view                      |
//! | `config`    | `relax.toml`                                         |
//! | `cli`       | Command line and dev server                          |

#[macro_use]
pub mod logger;

pub mod actor;
pub mod app;
pub mod cache;
pub mod cli;
pub mod component;
pub mod config;
pub mod core;
pub mod embed;
pub mod html;
pub mod reload;
pub mod router;

pub use app::App;
