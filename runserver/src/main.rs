//! Main entry point for the drush-runserver binary
//!
//! Wraps a test command in the suite lifecycle: the drush server is started
//! and reachable before the command runs and is stopped afterwards, or when
//! the harness is interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use runserver::{
    DrushRunserver, RunserverConfig, RunserverConfigBuilder, RunserverResult, SuiteEvent,
    SuiteHost, TestCommand,
};
use shared::{ProcessId, logging, process_info};

/// Exit code reported when the harness itself fails
const HARNESS_FAILURE: u8 = 2;
/// Exit code reported after Ctrl+C / SIGTERM (128 + SIGINT)
const INTERRUPTED: i32 = 130;

/// Runs a test command against a drush development server
#[derive(Parser, Debug)]
#[command(name = "drush-runserver")]
#[command(about = "Starts `drush runserver` around a test command and stops it afterwards")]
pub struct Args {
    /// JSON config file; flags given here override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Server executable (default: drush)
    #[arg(long)]
    pub binary: Option<String>,

    /// CMS root directory, relative to the project directory
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Address the server binds to (default: 127.0.0.1)
    #[arg(long)]
    pub hostname: Option<String>,

    /// Server port (default: 8080)
    #[arg(long)]
    pub port: Option<u16>,

    /// Environment override for the server, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// Seconds to sleep between readiness attempts
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub sleep: Option<Duration>,

    /// Maximum readiness attempts (default: 10)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Directory for drush.runserver.output.txt / drush.runserver.errors.txt
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Seconds to wait after SIGINT before killing the server
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub grace: Option<Duration>,

    /// Suite name passed to lifecycle events
    #[arg(long, default_value = "acceptance")]
    pub suite: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Project directory that relative paths hang off (default: current directory)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Test command to run once the server is reachable
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Args {
    /// Defaults, then the config file, then explicit flags
    pub fn to_config(&self) -> RunserverResult<RunserverConfig> {
        let base = match &self.config {
            Some(path) => RunserverConfig::from_json_file(path)?,
            None => RunserverConfig::default(),
        };

        let mut builder = RunserverConfigBuilder::from_config(base);
        if let Some(binary) = &self.binary {
            builder = builder.binary(binary.clone());
        }
        if let Some(root) = &self.root {
            builder = builder.root(root.clone());
        }
        if let Some(hostname) = &self.hostname {
            builder = builder.hostname(hostname.clone());
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        for (key, value) in &self.env {
            builder = builder.env(key.clone(), value.clone());
        }
        if let Some(sleep) = self.sleep {
            builder = builder.sleep(sleep);
        }
        if let Some(retries) = self.retries {
            builder = builder.retries(retries);
        }
        if let Some(log_dir) = &self.log_dir {
            builder = builder.log_dir(log_dir.clone());
        }
        if let Some(grace) = self.grace {
            builder = builder.grace(grace);
        }

        Ok(builder.build())
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("invalid number of seconds `{s}`: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid number of seconds `{s}`: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    ProcessId::init_harness();
    // A missing .env file is fine; whatever it sets is inherited by the server.
    dotenv::dotenv().ok();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("drush-runserver: {e}");
        return ExitCode::from(HARNESS_FAILURE);
    }

    match run(args).await {
        Ok(0) => {
            logging::log_success(ProcessId::current(), "Test command passed");
            ExitCode::SUCCESS
        }
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            logging::log_error(ProcessId::current(), "drush-runserver", &e);
            ExitCode::from(HARNESS_FAILURE)
        }
    }
}

fn init_logging(level: &str) -> RunserverResult<()> {
    logging::init_tracing(Some(level))?;
    Ok(())
}

async fn run(args: Args) -> RunserverResult<i32> {
    let project_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config = args.to_config()?;
    logging::log_startup(
        ProcessId::current(),
        &format!("drush runserver harness for {}", config.address()),
    );

    let mut host = SuiteHost::new().with_extension(DrushRunserver::new(config, &project_dir)?);

    let outcome = if args.command.is_empty() {
        tokio::select! {
            result = serve(&mut host, &args.suite) => Some(result),
            _ = shutdown_signal() => None,
        }
    } else {
        let command = TestCommand::from_argv(args.command.clone())?;
        tokio::select! {
            result = host.run_suite(&args.suite, &command) => Some(result),
            _ = shutdown_signal() => None,
        }
    };

    match outcome {
        Some(result) => result,
        None => {
            logging::log_shutdown(ProcessId::current(), "interrupted");
            host.shutdown().await?;
            Ok(INTERRUPTED)
        }
    }
}

/// Keep the server up until the harness is interrupted
async fn serve(host: &mut SuiteHost, suite: &str) -> RunserverResult<i32> {
    if let Err(e) = host
        .dispatch(&SuiteEvent::SuiteBefore {
            suite: suite.to_string(),
        })
        .await
    {
        let _ = host.shutdown().await;
        return Err(e);
    }

    process_info!(ProcessId::current(), "🔄 Drush server is up, press Ctrl+C to stop");
    std::future::pending().await
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => logging::log_error(ProcessId::current(), "SIGTERM handler", &e),
        }
    }

    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logging::log_error(ProcessId::current(), "Signal handling", &e);
        std::future::pending::<()>().await;
    }
}
