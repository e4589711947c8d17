//! Standard stream redirections for the server process
//!
//! stdin is a pipe kept open while the server runs, stdout goes to a file
//! truncated on every start, and stderr is appended across runs.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::{RunserverError, RunserverResult};

pub const OUTPUT_FILE: &str = "drush.runserver.output.txt";
pub const ERRORS_FILE: &str = "drush.runserver.errors.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSpec {
    log_dir: PathBuf,
}

/// Opened handles ready to hand to the child
pub struct OpenedDescriptors {
    pub stdin: Stdio,
    pub stdout: File,
    pub stderr: File,
}

impl DescriptorSpec {
    pub fn new<P: Into<PathBuf>>(log_dir: P) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn output_path(&self) -> PathBuf {
        self.log_dir.join(OUTPUT_FILE)
    }

    pub fn errors_path(&self) -> PathBuf {
        self.log_dir.join(ERRORS_FILE)
    }

    /// Create the log directory if needed and open both log files
    pub fn open(&self) -> RunserverResult<OpenedDescriptors> {
        std::fs::create_dir_all(&self.log_dir).map_err(|source| RunserverError::LogDir {
            path: self.log_dir.clone(),
            source,
        })?;

        let stdout = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.output_path())?;
        let stderr = OpenOptions::new().append(true).create(true).open(self.errors_path())?;

        Ok(OpenedDescriptors {
            stdin: Stdio::piped(),
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_paths() {
        let spec = DescriptorSpec::new("/tmp/_output");
        assert_eq!(spec.output_path(), PathBuf::from("/tmp/_output/drush.runserver.output.txt"));
        assert_eq!(spec.errors_path(), PathBuf::from("/tmp/_output/drush.runserver.errors.txt"));
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let spec = DescriptorSpec::new(temp.path().join("nested").join("_output"));

        let opened = spec.open().unwrap();
        drop(opened);

        assert!(spec.output_path().exists());
        assert!(spec.errors_path().exists());
    }

    #[test]
    fn test_output_truncated_errors_appended() {
        let temp = tempfile::tempdir().unwrap();
        let spec = DescriptorSpec::new(temp.path());

        for run in ["first", "second"] {
            let mut opened = spec.open().unwrap();
            writeln!(opened.stdout, "out {run}").unwrap();
            writeln!(opened.stderr, "err {run}").unwrap();
        }

        let output = std::fs::read_to_string(spec.output_path()).unwrap();
        let errors = std::fs::read_to_string(spec.errors_path()).unwrap();
        assert_eq!(output, "out second\n");
        assert_eq!(errors, "err first\nerr second\n");
    }

    #[test]
    fn test_open_fails_when_log_dir_is_a_file() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let spec = DescriptorSpec::new(blocker.join("_output"));
        assert!(matches!(spec.open(), Err(RunserverError::LogDir { .. })));
    }
}
