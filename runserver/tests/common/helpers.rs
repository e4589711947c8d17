//! Test helpers for building throwaway projects around a fake drush

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};
use tempfile::TempDir;

use super::fixtures::TestFixtures;
use runserver::RunserverConfig;

/// Temporary project with a `web/` root and an executable fake drush
pub struct TestProject {
    pub dir: TempDir,
    pub binary: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        Self::with_script(TestFixtures::FAKE_DRUSH)
    }

    pub fn with_script(script_body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp project dir");
        std::fs::create_dir_all(dir.path().join("web")).expect("web root");

        let binary = dir.path().join("drush");
        std::fs::write(&binary, format!("#!/bin/sh\n{script_body}")).expect("write fake drush");
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake drush");

        Self { dir, binary }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn output_log(&self) -> PathBuf {
        self.dir.path().join("tests/_output/drush.runserver.output.txt")
    }

    pub fn errors_log(&self) -> PathBuf {
        self.dir.path().join("tests/_output/drush.runserver.errors.txt")
    }

    pub fn config(&self, port: u16) -> RunserverConfig {
        RunserverConfig::builder()
            .binary(self.binary.to_string_lossy())
            .root("web")
            .hostname(TestFixtures::HOSTNAME)
            .port(port)
            .env("SITE_NAME", "integration")
            .sleep(TestFixtures::SLEEP)
            .retries(TestFixtures::RETRIES)
            .grace(Duration::from_secs(2))
            .build()
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// A port nothing listens on (bound then released)
    pub fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    }

    /// A listener standing in for the server's socket
    pub fn listening_port() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let port = listener.local_addr().expect("local addr").port();
        (listener, port)
    }

    pub fn process_exists(pid: u32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;
        kill(Pid::from_raw(pid as i32), None).is_ok()
    }

    /// Read a log file once it contains `needle`, giving up after five seconds
    pub fn read_when_contains(path: &Path, needle: &str) -> String {
        for _ in 0..100 {
            if let Ok(contents) = std::fs::read_to_string(path) {
                if contents.contains(needle) {
                    return contents;
                }
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        std::fs::read_to_string(path).unwrap_or_default()
    }

    /// Pid the fake drush wrote to its output log
    pub fn server_pid(output: &str) -> Option<u32> {
        output
            .lines()
            .find_map(|line| line.strip_prefix("pid: "))
            .and_then(|pid| pid.trim().parse().ok())
    }

    /// Wait for a spawned process to exit, killing it after `timeout`
    pub fn wait_for_exit(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(status) = child.try_wait().expect("poll child") {
                return Some(status);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        let _ = child.kill();
        let _ = child.wait();
        None
    }
}
