//! Actor Message Definitions
//!
//! ```text
//! FsActor --ChangePlan--> (coordinator | supervisor)
//! NotificationListener / coordinator --ReloadMsg--> ReloadActor
//! ```

use std::path::PathBuf;

use tokio::sync::oneshot;

/// Messages to the reload actor
#[derive(Debug)]
pub enum ReloadMsg {
    /// Reload the modules behind `paths` and push rebuilt views
    UpdateViews {
        paths: Vec<PathBuf>,
        /// Completion signal, for senders that must not overlap cycles
        done: Option<oneshot::Sender<ReloadOutcome>>,
    },
    Shutdown,
}

/// Result of one reload cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Views were rebuilt and broadcast
    Pushed { views: usize, clients: usize },
    /// Nothing to push (empty or unreadable cache, or a failed rebuild)
    NoViews,
    /// A module failed to load; nothing was pushed
    LoadFailed { module: String },
    /// Another cycle was in flight; this trigger was dropped
    Busy,
}
