//! Actor System for Live Reload
//!
//! ```text
//! FsActor ----> ReloadActor ----> LiveClients
//! (watch)     (reload + rebuild)  (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `reload` - Reload cycle and its actor
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod reload;

pub use coordinator::{ChangeSource, Coordinator};
