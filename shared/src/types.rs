//! Core types shared by the runserver crates

use std::fmt;
use std::sync::OnceLock;

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Identifies which side of the suite lifecycle is emitting logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessId {
    /// The `drush-runserver` command wrapper acting as the suite host
    Harness,
    /// The extension embedded in some other test host
    Plugin,
}

impl ProcessId {
    /// Initialize the global process ID for the command wrapper
    pub fn init_harness() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Harness)
    }

    /// Get the global process ID, defaulting to `Plugin` when nothing claimed it
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Plugin)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Harness => write!(f, "harness"),
            ProcessId::Plugin => write!(f, "plugin"),
        }
    }
}

/// Lifecycle state of a supervised server process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Ready,
    Stopping,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServerStatus::Stopped => "stopped",
            ServerStatus::Starting => "starting",
            ServerStatus::Ready => "ready",
            ServerStatus::Stopping => "stopping",
        };
        f.write_str(label)
    }
}
