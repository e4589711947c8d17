//! Command-line construction for the drush development server

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::RunserverConfig;

/// Everything needed to launch the server process
#[derive(Debug, Clone, PartialEq)]
pub struct ServerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl ServerCommand {
    /// `<binary> -r <root> runserver <hostname>:<port>`
    pub fn from_config(config: &RunserverConfig, project_dir: &Path) -> Self {
        let root = config.resolve_root(project_dir);
        let args = vec![
            OsString::from("-r"),
            root.clone().into_os_string(),
            OsString::from("runserver"),
            OsString::from(config.address()),
        ];

        Self {
            program: PathBuf::from(&config.binary),
            args,
            working_dir: root,
            env: config.env.clone(),
        }
    }

    /// Replace the program with an already resolved executable path
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Shell-style rendering for log output
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| quote(&part.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build a tokio command carrying program, args, cwd and env overrides
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.working_dir).envs(&self.env);
        cmd
    }
}

fn quote(part: &str) -> String {
    let special = |c: char| matches!(c, '\'' | '"' | '\\' | '$' | '`' | ';' | '&' | '|');
    let needs_quotes = part.is_empty() || part.chars().any(|c| c.is_whitespace() || special(c));
    if needs_quotes {
        format!("'{}'", part.replace('\'', r"'\''"))
    } else {
        part.to_string()
    }
}
