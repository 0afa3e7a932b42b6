//! Process-wide state shared across the codebase.

mod state;

pub use state::{
    RebuildGuard, RebuildTicket, is_shutdown, register_server, register_shutdown_signal,
    setup_shutdown_handler,
};
