//! Live reload of component views.
//!
//! # Architecture
//!
//! ```text
//! FsActor    -> (socket | in-process) -> ReloadActor -> LiveClients -> Browser
//!   (notify)        change message       (reload +       (broadcast)
//!                                          rebuild)
//! ```
//!
//! # Modules
//!
//! - `module` - module names, loaders and the loaded-module table
//! - `rebuild` - re-rendering cached invocations
//! - `classify` - deciding what a batch of file changes means
//! - `message` - change notification and live update messages
//! - `channel` - unix socket transport for change notifications
//! - `clients` - connected browser clients and broadcast
//! - `server` - WebSocket server for client connections

pub mod channel;
pub mod classify;
pub mod clients;
pub mod message;
pub mod module;
pub mod rebuild;
pub mod server;

pub use module::{
    LoaderChain, ModuleError, ModuleLoader, ModuleTable, TemplateLoader, resolve_module_name,
};
pub use rebuild::{RebuildPolicy, RenderedViews, ViewRebuilder};
