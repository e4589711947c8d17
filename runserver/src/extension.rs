//! Suite lifecycle extension
//!
//! [`DrushRunserver`] hooks into suite events: the server comes up (and is
//! reachable) before a suite runs and goes away when the suite finishes or
//! the host shuts down.

use async_trait::async_trait;
use std::fmt;
use std::path::Path;

use crate::config::RunserverConfig;
use crate::error::{RunserverError, RunserverResult};
use crate::services::DrushServer;
use crate::traits::ServerControl;
use shared::{ProcessId, process_debug, process_info};

pub const SUITE_BEFORE: &str = "suite.before";
pub const SUITE_AFTER: &str = "suite.after";
pub const SHUTDOWN: &str = "shutdown";

pub const EXTENSION_NAME: &str = "DrushRunserver";

/// Events a host dispatches to its extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteEvent {
    SuiteBefore { suite: String },
    SuiteAfter { suite: String },
    /// The host is going away, e.g. after Ctrl+C
    Shutdown,
}

impl SuiteEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SuiteEvent::SuiteBefore { .. } => SUITE_BEFORE,
            SuiteEvent::SuiteAfter { .. } => SUITE_AFTER,
            SuiteEvent::Shutdown => SHUTDOWN,
        }
    }

    /// Teardown events must reach every extension even after a failure
    pub fn is_teardown(&self) -> bool {
        !matches!(self, SuiteEvent::SuiteBefore { .. })
    }
}

impl fmt::Display for SuiteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteEvent::SuiteBefore { suite } | SuiteEvent::SuiteAfter { suite } => {
                write!(f, "{} ({suite})", self.name())
            }
            SuiteEvent::Shutdown => f.write_str(self.name()),
        }
    }
}

/// A plugin that reacts to suite lifecycle events
#[async_trait]
pub trait Extension: Send {
    fn name(&self) -> &str;

    /// Event names this extension wants to receive
    fn events(&self) -> &'static [&'static str];

    async fn on_event(&mut self, event: &SuiteEvent) -> RunserverResult<()>;
}

/// Starts `drush runserver` around a suite
pub struct DrushRunserver<S: ServerControl = DrushServer> {
    server: S,
}

impl DrushRunserver<DrushServer> {
    /// Validate the configuration and check the binary can be found
    pub fn new(config: RunserverConfig, project_dir: &Path) -> RunserverResult<Self> {
        let server = DrushServer::new(config, project_dir)
            .map_err(|e| RunserverError::extension(EXTENSION_NAME, e.to_string()))?;
        Ok(Self { server })
    }
}

impl<S: ServerControl> DrushRunserver<S> {
    /// Use any server implementation (fluent API)
    pub fn with_server(server: S) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut S {
        &mut self.server
    }

    /// Start the server and block until its port answers
    pub async fn start_server(&mut self) -> RunserverResult<()> {
        self.server.start().await?;
        if let Err(e) = self.server.wait_until_ready().await {
            // Do not leave a half-started server behind a failed suite.
            let _ = self.server.stop().await;
            return Err(e);
        }
        Ok(())
    }

    pub async fn stop_server(&mut self) -> RunserverResult<()> {
        self.server.stop().await
    }
}

#[async_trait]
impl<S: ServerControl> Extension for DrushRunserver<S> {
    fn name(&self) -> &str {
        EXTENSION_NAME
    }

    fn events(&self) -> &'static [&'static str] {
        &[SUITE_BEFORE, SUITE_AFTER, SHUTDOWN]
    }

    async fn on_event(&mut self, event: &SuiteEvent) -> RunserverResult<()> {
        process_debug!(ProcessId::current(), "{} handling {}", EXTENSION_NAME, event);

        let result = match event {
            SuiteEvent::SuiteBefore { suite } => {
                process_info!(ProcessId::current(), "Preparing Drush server for suite '{}'", suite);
                self.start_server().await
            }
            SuiteEvent::SuiteAfter { .. } | SuiteEvent::Shutdown => self.stop_server().await,
        };

        result.map_err(|e| match e {
            already @ RunserverError::Extension { .. } => already,
            other => RunserverError::extension(EXTENSION_NAME, other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockServerControl;
    use mockall::Sequence;

    fn before() -> SuiteEvent {
        SuiteEvent::SuiteBefore {
            suite: "acceptance".to_string(),
        }
    }

    fn after() -> SuiteEvent {
        SuiteEvent::SuiteAfter {
            suite: "acceptance".to_string(),
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(before().name(), "suite.before");
        assert_eq!(after().name(), "suite.after");
        assert_eq!(SuiteEvent::Shutdown.name(), "shutdown");
        assert_eq!(before().to_string(), "suite.before (acceptance)");
        assert!(!before().is_teardown());
        assert!(after().is_teardown());
        assert!(SuiteEvent::Shutdown.is_teardown());
    }

    #[test]
    fn test_subscribes_to_lifecycle_events() {
        let extension = DrushRunserver::with_server(MockServerControl::new());
        assert_eq!(extension.name(), "DrushRunserver");
        assert_eq!(extension.events(), &["suite.before", "suite.after", "shutdown"]);
    }

    #[tokio::test]
    async fn test_suite_before_starts_then_waits() {
        let mut server = MockServerControl::new();
        let mut seq = Sequence::new();
        server
            .expect_start()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        server
            .expect_wait_until_ready()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1));
        server.expect_stop().never();

        let mut extension = DrushRunserver::with_server(server);
        extension.on_event(&before()).await.unwrap();
    }

    #[tokio::test]
    async fn test_suite_after_and_shutdown_stop() {
        let mut server = MockServerControl::new();
        server.expect_stop().times(2).returning(|| Ok(()));

        let mut extension = DrushRunserver::with_server(server);
        extension.on_event(&after()).await.unwrap();
        extension.on_event(&SuiteEvent::Shutdown).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_failure_is_wrapped() {
        let mut server = MockServerControl::new();
        server
            .expect_start()
            .returning(|| Err(RunserverError::start("no such file")));
        server.expect_wait_until_ready().never();

        let mut extension = DrushRunserver::with_server(server);
        let err = extension.on_event(&before()).await.unwrap_err();

        match err {
            RunserverError::Extension { extension: name, message } => {
                assert_eq!(name, "DrushRunserver");
                assert!(message.contains("no such file"));
            }
            other => panic!("expected extension error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unready_server_is_stopped() {
        let mut server = MockServerControl::new();
        server.expect_start().returning(|| Ok(()));
        server.expect_wait_until_ready().returning(|| {
            Err(RunserverError::NotReady {
                address: "127.0.0.1:8080".to_string(),
                attempts: 10,
            })
        });
        server.expect_stop().times(1).returning(|| Ok(()));

        let mut extension = DrushRunserver::with_server(server);
        let err = extension.on_event(&before()).await.unwrap_err();
        assert!(err.to_string().contains("not reachable after 10 attempts"));
    }

    #[test]
    fn test_new_reports_missing_binary_as_extension_error() {
        let project = tempfile::tempdir().unwrap();
        let config = RunserverConfig::builder()
            .binary("no-such-drush-binary-for-tests")
            .build();

        match DrushRunserver::new(config, project.path()) {
            Err(RunserverError::Extension { message, .. }) => {
                assert!(message.contains("no-such-drush-binary-for-tests"));
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("binary should not resolve"),
        }
    }
}
