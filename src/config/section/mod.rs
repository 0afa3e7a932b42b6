//! Configuration section definitions.
//!
//! Each module corresponds to a section in `relax.toml`:
//!
//! | Module   | TOML Section | Purpose                                 |
//! |----------|--------------|-----------------------------------------|
//! | `app`    | `[app]`      | Template directory, environment         |
//! | `serve`  | `[serve]`    | Development server and WebSocket port   |
//! | `reload` | `[reload]`   | Live reload transport, cache, policy    |
//! | `page`   | `[[page]]`   | Routes rendered straight from a component |

mod app;
mod page;
mod reload;
mod serve;

pub use app::{AppSection, Env};
pub use page::PageConfig;
pub use reload::{ReloadConfig, ReloadMode};
pub use serve::ServeConfig;
