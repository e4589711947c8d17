//! Service-specific tests
//!
//! Each service has its own test file; the helpers below build throwaway
//! project directories with a fake `drush` script in them.


// Common test utilities for services
pub mod common {
    use std::net::TcpListener;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::config::RunserverConfig;

    /// Fake drush that records its arguments and then idles until signalled
    pub const IDLE_SCRIPT: &str = r#"echo "args: $*"
echo "fake drush warning" >&2
exec sleep 30
"#;

    /// Fake drush that dies straight away
    pub const CRASH_SCRIPT: &str = r#"echo "boom" >&2
exit 3
"#;

    /// Fake drush that ignores SIGINT
    pub const STUBBORN_SCRIPT: &str = r#"trap '' INT
exec sleep 30
"#;

    /// Fake drush that reports the interrupt before leaving
    pub const GRACEFUL_SCRIPT: &str = r#"trap 'echo interrupted; exit 0' INT
while :; do sleep 1; done
"#;

    /// Project directory holding a `site/` root and an executable fake binary
    pub struct FakeProject {
        pub dir: TempDir,
        pub binary: PathBuf,
    }

    impl FakeProject {
        #[cfg(unix)]
        pub fn new(script_body: &str) -> Self {
            use std::os::unix::fs::PermissionsExt;

            let dir = tempfile::tempdir().expect("temp project dir");
            std::fs::create_dir_all(dir.path().join("site")).expect("site root");

            let binary = dir.path().join("fake-drush");
            std::fs::write(&binary, format!("#!/bin/sh\n{script_body}")).expect("write fake drush");
            std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
                .expect("chmod fake drush");

            Self { dir, binary }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        pub fn site(&self) -> PathBuf {
            self.dir.path().join("site")
        }

        pub fn log_dir(&self) -> PathBuf {
            self.dir.path().join("_output")
        }

        /// Fast-polling configuration pointed at the fake binary
        pub fn config(&self, port: u16) -> RunserverConfig {
            RunserverConfig::builder()
                .binary(self.binary.to_string_lossy())
                .root("site")
                .hostname("127.0.0.1")
                .port(port)
                .sleep(Duration::from_millis(50))
                .retries(20)
                .log_dir("_output")
                .grace(Duration::from_secs(2))
                .build()
        }
    }

    /// A port nothing is listening on (bound then released)
    pub fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    }

    /// Poll a file until it contains `needle` or two seconds pass
    pub async fn wait_for_file_contents(path: &Path, needle: &str) -> String {
        for _ in 0..40 {
            if let Ok(contents) = std::fs::read_to_string(path) {
                if contents.contains(needle) {
                    return contents;
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        std::fs::read_to_string(path).unwrap_or_default()
    }
}
