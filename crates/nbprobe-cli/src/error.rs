//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// JupyterLab server failed to start
    #[error("JupyterLab server failed: {message}")]
    Server {
        /// Error message
        message: String,
    },

    /// Server never reported it was running
    #[error("JupyterLab server did not start within {secs}s")]
    StartupTimeout {
        /// Startup budget in seconds
        secs: u64,
    },

    /// A child command could not be run
    #[error("Command `{command}` failed: {message}")]
    Command {
        /// Command line
        command: String,
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// nbprobe library error
    #[error("nbprobe error: {0}")]
    Lab(#[from] nbprobe::LabError),

    /// YAML output error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a server error
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Create a command error
    #[must_use]
    pub fn command(command: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Command {
            command: command.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_startup_timeout_error() {
        let err = CliError::StartupTimeout { secs: 120 };
        assert_eq!(err.to_string(), "JupyterLab server did not start within 120s");
    }

    #[test]
    fn test_command_error() {
        let err = CliError::command("yarn install", "not found");
        assert_eq!(err.to_string(), "Command `yarn install` failed: not found");
    }

    #[test]
    fn test_from_lab_error() {
        let err: CliError = nbprobe::LabError::not_found("div=File").into();
        assert!(matches!(err, CliError::Lab(_)));
        assert!(err.to_string().contains("div=File"));
    }
}
