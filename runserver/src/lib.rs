//! Drush development server harness
//!
//! Starts `drush runserver` before a test suite, waits until its TCP port
//! accepts connections, and makes sure the server is gone once the suite
//! finishes, the extension is dropped, or the host is interrupted.
//!
//! ```no_run
//! use runserver::{DrushRunserver, RunserverConfig, SuiteHost, TestCommand};
//!
//! # async fn example() -> runserver::RunserverResult<()> {
//! let config = RunserverConfig::builder().root("web").port(8888).build();
//! let project_dir = std::env::current_dir()?;
//!
//! let mut host = SuiteHost::new().with_extension(DrushRunserver::new(config, &project_dir)?);
//! let command = TestCommand::from_argv(vec!["vendor/bin/codecept".into(), "run".into()])?;
//! let exit_code = host.run_suite("acceptance", &command).await?;
//! # let _ = exit_code;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod extension;
pub mod host;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{RunserverConfig, RunserverConfigBuilder};
pub use crate::core::{DescriptorSpec, ReadinessPolicy, ServerCommand};
pub use error::{RunserverError, RunserverResult};
pub use extension::{DrushRunserver, Extension, SuiteEvent};
pub use host::{SuiteHost, TestCommand};
pub use services::{DrushServer, TcpPortProbe};
pub use traits::{PortProbe, ServerControl};
