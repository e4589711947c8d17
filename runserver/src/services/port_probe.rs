//! TCP port probe backed by tokio sockets

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::traits::PortProbe;

/// Opens (and immediately drops) a TCP connection to test reachability
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPortProbe;

impl TcpPortProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn probe(&self, address: &str, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::trace!(address, error = %e, "Connection refused");
                false
            }
            Err(_) => {
                tracing::trace!(address, ?timeout, "Connection attempt timed out");
                false
            }
        }
    }
}
