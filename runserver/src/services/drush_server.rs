//! Real server supervisor
//!
//! Spawns `drush runserver` with redirected output, polls its port, and tears
//! it down on stop or drop.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::{Child, ChildStdin};

use crate::config::RunserverConfig;
use crate::core::{DescriptorSpec, ReadinessPolicy, ServerCommand, wait_for_port};
use crate::error::{RunserverError, RunserverResult};
use crate::services::port_probe::TcpPortProbe;
use crate::traits::{PortProbe, ServerControl};
use shared::{ProcessId, ServerStatus, process_debug, process_error, process_info, process_warn};

/// Longest a drop will block waiting for the server to honour SIGINT
pub const DROP_GRACE_CAP: Duration = Duration::from_millis(500);

/// Handle for the running server and the stdin pipe it was given
struct ServerHandle {
    child: Child,
    stdin: Option<ChildStdin>,
    pid: u32,
    started_at: Instant,
}

pub struct DrushServer<P: PortProbe = TcpPortProbe> {
    config: RunserverConfig,
    command: ServerCommand,
    descriptors: DescriptorSpec,
    probe: P,
    handle: Option<ServerHandle>,
    status: ServerStatus,
}

impl DrushServer<TcpPortProbe> {
    /// Validate the configuration and resolve the server binary.
    ///
    /// Relative paths in the configuration are anchored to `project_dir`.
    pub fn new(config: RunserverConfig, project_dir: &Path) -> RunserverResult<Self> {
        config.validate()?;
        let program = resolve_binary(&config.binary, project_dir)?;
        let command = ServerCommand::from_config(&config, project_dir).with_program(program);
        let descriptors = DescriptorSpec::new(config.resolve_log_dir(project_dir));

        Ok(Self {
            config,
            command,
            descriptors,
            probe: TcpPortProbe::new(),
            handle: None,
            status: ServerStatus::Stopped,
        })
    }
}

impl<P: PortProbe> DrushServer<P> {
    /// Swap the readiness probe (fluent API)
    pub fn with_probe<Q: PortProbe>(mut self, probe: Q) -> DrushServer<Q> {
        let handle = self.handle.take();
        DrushServer {
            config: self.config.clone(),
            command: self.command.clone(),
            descriptors: self.descriptors.clone(),
            probe,
            handle,
            status: self.status,
        }
    }

    pub fn config(&self) -> &RunserverConfig {
        &self.config
    }

    pub fn command(&self) -> &ServerCommand {
        &self.command
    }

    pub fn descriptors(&self) -> &DescriptorSpec {
        &self.descriptors
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }
}

#[async_trait]
impl<P: PortProbe> ServerControl for DrushServer<P> {
    async fn start(&mut self) -> RunserverResult<()> {
        if self.is_running() {
            process_debug!(ProcessId::current(), "Drush server already running, start skipped");
            return Ok(());
        }

        process_info!(ProcessId::current(), "Starting Drush server...");
        self.status = ServerStatus::Starting;

        let opened = match self.descriptors.open() {
            Ok(opened) => opened,
            Err(e) => {
                self.status = ServerStatus::Stopped;
                return Err(e);
            }
        };

        let mut cmd = self.command.to_command();
        cmd.stdin(opened.stdin)
            .stdout(opened.stdout)
            .stderr(opened.stderr)
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.status = ServerStatus::Stopped;
                let command = self.command.display();
                process_error!(ProcessId::current(), "❌ Failed to spawn `{}`: {}", command, e);
                return Err(RunserverError::start(format!("{command}: {e}")));
            }
        };

        let pid = match child.try_wait() {
            Ok(None) => child.id(),
            Ok(Some(status)) => {
                self.status = ServerStatus::Stopped;
                return Err(RunserverError::start(format!("server exited immediately ({status})")));
            }
            Err(e) => {
                self.status = ServerStatus::Stopped;
                let reason = format!("could not query server status: {e}");
                return Err(abandon(&mut child, reason).await);
            }
        };
        let Some(pid) = pid else {
            self.status = ServerStatus::Stopped;
            return Err(abandon(&mut child, "spawned server has no pid").await);
        };

        let stdin = child.stdin.take();
        self.handle = Some(ServerHandle {
            child,
            stdin,
            pid,
            started_at: Instant::now(),
        });

        process_info!(
            ProcessId::current(),
            pid,
            command = %self.command.display(),
            "Started Drush server."
        );
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> RunserverResult<u32> {
        if self.handle.is_none() {
            return Err(RunserverError::NotRunning);
        }

        let address = self.config.address();
        let policy = ReadinessPolicy::new(self.config.retries, self.config.sleep);
        process_debug!(
            ProcessId::current(),
            "Waiting for {} (up to {} attempts, {:?} apart)",
            address,
            policy.attempts,
            policy.sleep
        );

        let handle = &mut self.handle;
        let result = wait_for_port(&self.probe, &address, policy, || check_alive(handle)).await;

        match result {
            Ok(attempts) => {
                self.status = ServerStatus::Ready;
                process_info!(
                    ProcessId::current(),
                    "✅ Drush server reachable at {} after {} attempt(s)",
                    address,
                    attempts
                );
                Ok(attempts)
            }
            Err(e) => {
                if self.handle.is_none() {
                    self.status = ServerStatus::Stopped;
                }
                process_error!(
                    ProcessId::current(),
                    "❌ Drush server at {} not ready: {}",
                    address,
                    e
                );
                Err(e)
            }
        }
    }

    async fn stop(&mut self) -> RunserverResult<()> {
        let Some(mut handle) = self.handle.take() else {
            self.status = ServerStatus::Stopped;
            return Ok(());
        };

        process_info!(ProcessId::current(), pid = handle.pid, "Stopping Drush server...");
        self.status = ServerStatus::Stopping;

        // Pipes are closed before the process is signalled.
        drop(handle.stdin.take());
        let result = terminate(&mut handle, self.config.grace).await;
        self.status = ServerStatus::Stopped;

        match result {
            Ok(()) => {
                process_info!(
                    ProcessId::current(),
                    pid = handle.pid,
                    uptime = ?handle.started_at.elapsed(),
                    "Stopped Drush server."
                );
                Ok(())
            }
            Err(e) => {
                process_error!(ProcessId::current(), "❌ Failed to stop Drush server: {}", e);
                Err(e)
            }
        }
    }

    fn is_running(&mut self) -> bool {
        let exited = match self.handle.as_mut() {
            None => return false,
            Some(handle) => !matches!(handle.child.try_wait(), Ok(None)),
        };
        if exited {
            self.handle = None;
            self.status = ServerStatus::Stopped;
        }
        !exited
    }

    fn pid(&self) -> Option<u32> {
        self.handle.as_ref().map(|handle| handle.pid)
    }
}

/// Dropping a running server interrupts it and blocks the current thread,
/// waiting at most [`DROP_GRACE_CAP`] before killing it. Inside a runtime, prefer
/// [`ServerControl::stop`] so the wait does not tie up a worker thread.
impl<P: PortProbe> Drop for DrushServer<P> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            process_warn!(
                ProcessId::current(),
                pid = handle.pid,
                "🚨 Emergency cleanup: stopping Drush server on drop"
            );
            drop(handle.stdin.take());
            terminate_blocking(&mut handle, self.config.grace.min(DROP_GRACE_CAP));
        }
    }
}

fn check_alive(handle: &mut Option<ServerHandle>) -> RunserverResult<()> {
    let Some(current) = handle.as_mut() else {
        return Err(RunserverError::NotRunning);
    };
    match current.child.try_wait()? {
        None => Ok(()),
        Some(status) => {
            *handle = None;
            Err(RunserverError::ServerExited {
                status: status.to_string(),
            })
        }
    }
}

/// SIGINT, wait out the grace period, then SIGKILL
async fn terminate(handle: &mut ServerHandle, grace: Duration) -> RunserverResult<()> {
    if handle.child.try_wait()?.is_some() {
        return Ok(());
    }

    if let Err(e) = interrupt(handle.pid) {
        process_warn!(ProcessId::current(), "⚠️ {}, killing instead", e);
        handle.child.kill().await?;
        return Ok(());
    }

    match tokio::time::timeout(grace, handle.child.wait()).await {
        Ok(status) => {
            let status = status?;
            process_debug!(ProcessId::current(), "Drush server exited with {}", status);
            Ok(())
        }
        Err(_) => {
            process_warn!(
                ProcessId::current(),
                "🔨 Drush server ignored SIGINT for {:?}, killing",
                grace
            );
            handle.child.kill().await?;
            Ok(())
        }
    }
}

/// Synchronous variant for `Drop`, where nothing can be awaited
fn terminate_blocking(handle: &mut ServerHandle, grace: Duration) {
    if !matches!(handle.child.try_wait(), Ok(None)) {
        return;
    }

    if interrupt(handle.pid).is_ok() && reap_within(handle, grace) {
        return;
    }

    if let Err(e) = handle.child.start_kill() {
        process_error!(
            ProcessId::current(),
            "❌ Failed to kill Drush server {}: {}",
            handle.pid,
            e
        );
        return;
    }
    // Reap so no zombie outlives the handle
    reap_within(handle, Duration::from_millis(200));
}

fn reap_within(handle: &mut ServerHandle, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        if !matches!(handle.child.try_wait(), Ok(None)) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// Kill a child that cannot be tracked and turn `reason` into a start error
pub(crate) async fn abandon(child: &mut Child, reason: impl Into<String>) -> RunserverError {
    let reason = reason.into();
    if let Err(e) = child.kill().await {
        process_warn!(ProcessId::current(), "⚠️ Failed to kill untracked Drush server: {}", e);
    }
    RunserverError::start(reason)
}

#[cfg(unix)]
fn interrupt(pid: u32) -> RunserverResult<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| RunserverError::Signal {
        pid,
        message: "pid out of range".to_string(),
    })?;

    match signal::kill(Pid::from_raw(raw), Signal::SIGINT) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(RunserverError::Signal {
            pid,
            message: e.to_string(),
        }),
    }
}

#[cfg(not(unix))]
fn interrupt(pid: u32) -> RunserverResult<()> {
    Err(RunserverError::Signal {
        pid,
        message: "interrupt signals are not supported on this platform".to_string(),
    })
}

/// Resolve the configured binary the way a shell would
///
/// Paths with a separator are taken relative to the project directory; bare
/// names are searched on PATH.
pub fn resolve_binary(binary: &str, project_dir: &Path) -> RunserverResult<PathBuf> {
    which::which_in(binary, std::env::var_os("PATH"), project_dir).map_err(|e| {
        process_debug!(ProcessId::current(), "Binary lookup for '{}' failed: {}", binary, e);
        RunserverError::BinaryNotFound {
            binary: binary.to_string(),
        }
    })
}
