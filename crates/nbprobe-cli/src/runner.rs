//! Harness runner: server up, test command, server down

use crate::commands::{ConfigArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::server::{kill_processes, resolve_notebook_dir, LabServer, ServerConfig};
use nbprobe::config::ENV_LAB_URL;
use nbprobe::LabConfig;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{info, warn};

/// Exit code for a failed or interrupted run
pub const FAILURE_EXIT_CODE: u8 = 20;

/// Test command used when none is given
pub const DEFAULT_TEST_COMMAND: [&str; 6] =
    ["cargo", "test", "--features", "browser", "--", "--ignored"];

/// Stray processes cleaned up after an interrupt
const STRAY_DRIVER_PROCESS: &str = "webdriver";
const STRAY_SERVER_PROCESS: &str = "jupyter";

/// Test command for `args`, falling back to [`DEFAULT_TEST_COMMAND`]
#[must_use]
pub fn test_command(args: &RunArgs) -> Vec<String> {
    if args.test_command.is_empty() {
        DEFAULT_TEST_COMMAND.iter().map(ToString::to_string).collect()
    } else {
        args.test_command.clone()
    }
}

/// Exit code for the test command's status
#[must_use]
pub fn exit_code_for(status: ExitStatus) -> u8 {
    if status.success() {
        0
    } else {
        FAILURE_EXIT_CODE
    }
}

/// Effective page object configuration as YAML
///
/// # Errors
///
/// Fails on an unreadable file, invalid YAML or an invalid env override.
pub fn show_config(args: &ConfigArgs) -> CliResult<String> {
    let config = match args.file {
        Some(ref path) => LabConfig::from_file(path)?,
        None => LabConfig::default(),
    };
    Ok(config.with_env_overrides()?.to_yaml()?)
}

/// Runs the end-to-end harness
#[derive(Debug)]
pub struct HarnessRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl HarnessRunner {
    /// Create a new runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run setup, start the server, run the tests, stop the server.
    ///
    /// Returns the process exit code: 0 when the test command passed,
    /// [`FAILURE_EXIT_CODE`] when it failed or Ctrl+C arrived.
    ///
    /// # Errors
    ///
    /// Fails when the notebook directory is missing, the server does not
    /// come up, or the test command cannot be spawned.
    pub async fn run(&mut self, args: &RunArgs) -> CliResult<u8> {
        self.reporter.header("nbprobe run");

        if let Some(ref setup) = args.setup {
            self.run_setup(setup).await?;
        }

        let notebook_dir = resolve_notebook_dir(&args.notebook_dir)?;
        let server_config = ServerConfig::new(&args.jupyter, args.port, notebook_dir)
            .with_startup_timeout(Duration::from_secs(args.startup_timeout));

        self.reporter.start_spinner("starting JupyterLab");
        let started = tokio::select! {
            started = LabServer::start(&server_config, &self.reporter) => started,
            _ = tokio::signal::ctrl_c() => {
                self.reporter.finish_spinner();
                return Ok(self.interrupted(None, args.port).await);
            }
        };
        self.reporter.finish_spinner();
        let server = started?;
        self.reporter
            .success(&format!("JupyterLab is running at {}", server_config.lab_url()));

        let command = test_command(args);
        let command_line = command.join(" ");
        self.reporter.info(&format!("running {command_line}"));
        if self.config.verbosity.is_verbose() {
            self.reporter
                .info(&format!("{ENV_LAB_URL}={}", server_config.lab_url()));
        }

        let (program, rest) = command
            .split_first()
            .ok_or_else(|| CliError::config("empty test command"))?;
        let spawned = Command::new(program)
            .args(rest)
            .env(ENV_LAB_URL, server_config.lab_url())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                server.shutdown().await;
                return Err(CliError::command(command_line, e));
            }
        };

        let start = Instant::now();
        let status = tokio::select! {
            status = child.wait() => status,
            _ = tokio::signal::ctrl_c() => {
                let _ = child.kill().await;
                return Ok(self.interrupted(Some(server), args.port).await);
            }
        };
        server.shutdown().await;

        let status = status.map_err(|e| CliError::command(command_line, e))?;
        info!(%status, "test command finished");
        self.reporter.summary(status.success(), start.elapsed());
        Ok(exit_code_for(status))
    }

    async fn run_setup(&self, setup: &str) -> CliResult<()> {
        self.reporter.info(&format!("setup: {setup}"));
        let status = Command::new("sh")
            .args(["-c", setup])
            .status()
            .await
            .map_err(|e| CliError::command(setup, e))?;
        if !status.success() {
            warn!(%status, setup, "setup command failed");
            self.reporter
                .warning(&format!("setup command exited with {status}; continuing"));
        }
        Ok(())
    }

    async fn interrupted(&self, server: Option<LabServer>, port: u16) -> u8 {
        self.reporter.warning("interrupted, shutting down");
        if let Some(server) = server {
            server.shutdown().await;
        }
        kill_processes(STRAY_DRIVER_PROCESS, None).await;
        kill_processes(STRAY_SERVER_PROCESS, Some(port)).await;
        FAILURE_EXIT_CODE
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}
