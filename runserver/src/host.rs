//! Minimal suite host
//!
//! Dispatches lifecycle events to registered extensions and wraps an external
//! test command in `suite.before` / `suite.after`.

use std::process::ExitStatus;

use crate::error::{RunserverError, RunserverResult};
use crate::extension::{Extension, SuiteEvent};
use shared::{ProcessId, process_debug, process_info, process_warn};

/// External command whose exit code decides the suite outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TestCommand {
    /// First element is the program, the rest are its arguments
    pub fn from_argv(argv: Vec<String>) -> RunserverResult<Self> {
        let mut parts = argv.into_iter();
        let program = parts
            .next()
            .filter(|program| !program.is_empty())
            .ok_or_else(|| RunserverError::config("command", "test command must not be empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run with inherited stdio and return the exit code
    pub async fn run(&self) -> RunserverResult<i32> {
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| RunserverError::start(format!("test command `{}`: {e}", self.display())))?;
        Ok(exit_code(status))
    }
}

/// Exit code, or 128 + signal number for a signalled process
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[derive(Default)]
pub struct SuiteHost {
    extensions: Vec<Box<dyn Extension>>,
}

impl SuiteHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension (fluent API)
    pub fn with_extension<E: Extension + 'static>(mut self, extension: E) -> Self {
        self.register(Box::new(extension));
        self
    }

    pub fn register(&mut self, extension: Box<dyn Extension>) {
        process_debug!(
            ProcessId::current(),
            "Registered extension {} for {:?}",
            extension.name(),
            extension.events()
        );
        self.extensions.push(extension);
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Deliver `event` to every subscribed extension in registration order.
    ///
    /// `suite.before` stops at the first failure. Teardown events reach all
    /// subscribers and report the first failure afterwards.
    pub async fn dispatch(&mut self, event: &SuiteEvent) -> RunserverResult<()> {
        let mut first_error = None;

        for extension in self.extensions.iter_mut() {
            if !extension.events().contains(&event.name()) {
                continue;
            }

            if let Err(e) = extension.on_event(event).await {
                if !event.is_teardown() {
                    return Err(e);
                }
                process_warn!(
                    ProcessId::current(),
                    "⚠️ {} failed during {}: {}",
                    extension.name(),
                    event,
                    e
                );
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// before → test command → after; `suite.after` is dispatched on every path
    pub async fn run_suite(&mut self, suite: &str, command: &TestCommand) -> RunserverResult<i32> {
        let before = SuiteEvent::SuiteBefore {
            suite: suite.to_string(),
        };
        let after = SuiteEvent::SuiteAfter {
            suite: suite.to_string(),
        };

        if let Err(e) = self.dispatch(&before).await {
            let _ = self.dispatch(&after).await;
            return Err(e);
        }

        process_info!(
            ProcessId::current(),
            "▶️ Running suite '{}': {}",
            suite,
            command.display()
        );
        let outcome = command.run().await;
        let teardown = self.dispatch(&after).await;

        let code = outcome?;
        teardown?;
        process_info!(
            ProcessId::current(),
            "🏁 Suite '{}' finished with exit code {}",
            suite,
            code
        );
        Ok(code)
    }

    /// Tell every extension the host is going away
    pub async fn shutdown(&mut self) -> RunserverResult<()> {
        self.dispatch(&SuiteEvent::Shutdown).await
    }
}
