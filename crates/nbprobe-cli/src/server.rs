//! JupyterLab server process management.
//!
//! The server runs in its own process group so that shutdown can take the
//! kernels it spawned down with it.

use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How to launch the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Launcher executable (`jupyter`)
    pub program: String,
    /// Listening port
    pub port: u16,
    /// Absolute notebook directory
    pub notebook_dir: PathBuf,
    /// Budget for the "is running" line
    pub startup_timeout: Duration,
}

impl ServerConfig {
    /// Create a config with a 120 second startup budget
    #[must_use]
    pub fn new(program: impl Into<String>, port: u16, notebook_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            port,
            notebook_dir: notebook_dir.into(),
            startup_timeout: Duration::from_secs(120),
        }
    }

    /// Set the startup budget
    #[must_use]
    pub const fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Arguments passed to the launcher
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        vec![
            "lab".to_string(),
            "--no-browser".to_string(),
            format!("--notebook-dir={}", self.notebook_dir.display()),
            "--NotebookApp.token=".to_string(),
            "--port".to_string(),
            self.port.to_string(),
        ]
    }

    /// Full command line, for messages
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// URL the page objects should load
    #[must_use]
    pub fn lab_url(&self) -> String {
        lab_url(self.port)
    }
}

/// `http://127.0.0.1:<port>/lab`
#[must_use]
pub fn lab_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}/lab")
}

/// Whether a server output line announces readiness
#[must_use]
pub fn is_ready_line(line: &str) -> bool {
    line.contains("Jupyter") && line.contains("is running")
}

/// Whitespace separated pids, as printed by `pgrep` and `lsof -t`
#[must_use]
pub fn parse_pids(text: &str) -> Vec<u32> {
    text.split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect()
}

/// A running JupyterLab server
#[derive(Debug)]
pub struct LabServer {
    child: Child,
    pid: u32,
    drain: JoinHandle<()>,
}

impl LabServer {
    /// Spawn the server and wait until it reports that it is running.
    ///
    /// Every output line is echoed through `reporter` until then; later
    /// lines go to the debug log.
    ///
    /// # Errors
    ///
    /// Fails when the launcher cannot be spawned, exits before becoming
    /// ready, or misses the startup budget. The process group is killed in
    /// the latter two cases.
    pub async fn start(config: &ServerConfig, reporter: &ProgressReporter) -> CliResult<Self> {
        info!(command = %config.command_line(), "starting JupyterLab");

        let mut command = Command::new(&config.program);
        command
            .args(config.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| CliError::command(config.command_line(), e))?;
        let pid = child
            .id()
            .ok_or_else(|| CliError::server("server exited immediately"))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx));
        }
        reporter.set_message(&format!(
            "waiting for JupyterLab on port {} (pid {pid})",
            config.port
        ));

        let ready = tokio::time::timeout(config.startup_timeout, async {
            while let Some(line) = rx.recv().await {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                reporter.echo(line);
                if is_ready_line(line) {
                    return true;
                }
            }
            false
        })
        .await;

        match ready {
            Ok(true) => {}
            Ok(false) => {
                kill_group(&mut child, pid).await;
                return Err(CliError::server(format!(
                    "`{}` exited before reporting it was running",
                    config.command_line()
                )));
            }
            Err(_) => {
                kill_group(&mut child, pid).await;
                return Err(CliError::StartupTimeout {
                    secs: config.startup_timeout.as_secs(),
                });
            }
        }

        info!(pid, url = %config.lab_url(), "JupyterLab is running");
        let drain = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                debug!(target: "nbprobe_cli::jupyter", "{line}");
            }
        });

        Ok(Self { child, pid, drain })
    }

    /// Process group id of the server
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Kill the whole process group and reap the server
    pub async fn shutdown(mut self) {
        info!(pid = self.pid, "stopping JupyterLab");
        kill_group(&mut self.child, self.pid).await;
        self.drain.abort();
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

async fn kill_group(child: &mut Child, pid: u32) {
    #[cfg(unix)]
    {
        let group = format!("-{pid}");
        if let Err(e) = Command::new("kill")
            .args(["-KILL", "--", &group])
            .status()
            .await
        {
            warn!(pid, error = %e, "failed to signal process group");
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    // Already gone when the group kill worked; this just reaps it.
    let _ = child.kill().await;
}

/// Kill processes whose command line matches `name`.
///
/// With a port, only those that also have a socket on that port are killed.
pub async fn kill_processes(name: &str, port: Option<u16>) {
    let mut pids = pids_from(Command::new("pgrep").args(["-f", name])).await;
    if let Some(port) = port {
        let listening = pids_from(Command::new("lsof").args(["-ti", &format!("tcp:{port}")])).await;
        pids.retain(|pid| listening.contains(pid));
    }

    for pid in pids {
        debug!(pid, name, "killing stray process");
        if let Err(e) = Command::new("kill")
            .args(["-KILL", &pid.to_string()])
            .status()
            .await
        {
            warn!(pid, error = %e, "failed to kill stray process");
        }
    }
}

async fn pids_from(command: &mut Command) -> Vec<u32> {
    match command.stdin(Stdio::null()).stderr(Stdio::null()).output().await {
        Ok(output) => parse_pids(&String::from_utf8_lossy(&output.stdout)),
        Err(e) => {
            debug!(error = %e, "process lookup unavailable");
            Vec::new()
        }
    }
}

/// Resolve the notebook directory to an absolute path
///
/// # Errors
///
/// Fails when the directory does not exist.
pub fn resolve_notebook_dir(dir: &Path) -> CliResult<PathBuf> {
    let resolved = std::fs::canonicalize(dir).map_err(|e| {
        CliError::config(format!("notebook directory {}: {e}", dir.display()))
    })?;
    if resolved.is_dir() {
        Ok(resolved)
    } else {
        Err(CliError::config(format!(
            "notebook directory {} is not a directory",
            dir.display()
        )))
    }
}
