//! Trait definitions with mockall annotations for testing
//!
//! The extension only talks to the server through [`ServerControl`], and the
//! readiness loop only dials through [`PortProbe`], so both can be swapped
//! for mocks in tests.

use std::time::Duration;

use crate::error::RunserverResult;

/// Lifecycle control over one supervised server process
#[mockall::automock]
#[async_trait::async_trait]
pub trait ServerControl: Send {
    /// Spawn the server unless one is already running
    async fn start(&mut self) -> RunserverResult<()>;

    /// Poll the server's port until it accepts connections
    ///
    /// # Returns
    /// Number of attempts it took for the port to answer
    async fn wait_until_ready(&mut self) -> RunserverResult<u32>;

    /// Terminate the server; a no-op when nothing is running
    async fn stop(&mut self) -> RunserverResult<()>;

    /// Whether a live server process is held
    fn is_running(&mut self) -> bool;

    /// OS process id of the running server
    fn pid(&self) -> Option<u32>;
}

/// TCP reachability check for a `host:port` address
#[mockall::automock]
#[async_trait::async_trait]
pub trait PortProbe: Send + Sync {
    /// True when a connection could be opened within `timeout`
    async fn probe(&self, address: &str, timeout: Duration) -> bool;
}
