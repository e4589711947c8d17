//! Service implementations
//!
//! Real implementations of the service traits that touch processes and sockets.

pub mod drush_server;
pub mod port_probe;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use drush_server::{DrushServer, resolve_binary};
pub use port_probe::TcpPortProbe;
