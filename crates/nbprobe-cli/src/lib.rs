//! nbprobe CLI library
//!
//! Run harness for JupyterLab browser tests: starts a JupyterLab server in
//! its own process group, runs a test command against it, and shuts the
//! server down again. Exit code 20 means the tests failed or the run was
//! interrupted.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod runner;
pub mod server;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, RunArgs, DEFAULT_PORT};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::ProgressReporter;
pub use runner::{show_config, HarnessRunner, FAILURE_EXIT_CODE};
pub use server::{lab_url, LabServer, ServerConfig};
