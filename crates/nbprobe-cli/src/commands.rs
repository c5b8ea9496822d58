//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default JupyterLab port
pub const DEFAULT_PORT: u16 = 9999;

/// nbprobe: run JupyterLab end-to-end browser tests
#[derive(Parser, Debug)]
#[command(name = "nbprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start JupyterLab, run the browser tests against it, then shut it down
    ///
    /// Exits with code 20 when the test command fails or is interrupted.
    Run(RunArgs),

    /// Show the effective page object configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the JupyterLab server
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory JupyterLab serves notebooks from
    #[arg(long, default_value = "..")]
    pub notebook_dir: PathBuf,

    /// Shell command run before the server starts (e.g. "yarn install")
    #[arg(long)]
    pub setup: Option<String>,

    /// Seconds to wait for the server to report it is running
    #[arg(long, default_value = "120")]
    pub startup_timeout: u64,

    /// JupyterLab launcher executable
    #[arg(long, default_value = "jupyter")]
    pub jupyter: String,

    /// Test command (default: cargo test --features browser -- --ignored)
    #[arg(last = true)]
    pub test_command: Vec<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// YAML file to load instead of the defaults
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["nbprobe", "run"]).unwrap();
            match cli.command {
                Commands::Run(args) => {
                    assert_eq!(args.port, 9999);
                    assert_eq!(args.notebook_dir, PathBuf::from(".."));
                    assert_eq!(args.startup_timeout, 120);
                    assert_eq!(args.jupyter, "jupyter");
                    assert!(args.setup.is_none());
                    assert!(args.test_command.is_empty());
                }
                Commands::Config(_) => panic!("expected run"),
            }
        }

        #[test]
        fn test_run_with_test_command() {
            let cli = Cli::try_parse_from([
                "nbprobe",
                "-vv",
                "run",
                "--port",
                "8888",
                "--setup",
                "yarn install",
                "--",
                "yarn",
                "run",
                "test",
                "--bail",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 2);
            match cli.command {
                Commands::Run(args) => {
                    assert_eq!(args.port, 8888);
                    assert_eq!(args.setup.as_deref(), Some("yarn install"));
                    assert_eq!(args.test_command, vec!["yarn", "run", "test", "--bail"]);
                }
                Commands::Config(_) => panic!("expected run"),
            }
        }

        #[test]
        fn test_config_file() {
            let cli = Cli::try_parse_from(["nbprobe", "config", "--file", "lab.yaml"]).unwrap();
            match cli.command {
                Commands::Config(args) => {
                    assert_eq!(args.file, Some(PathBuf::from("lab.yaml")));
                }
                Commands::Run(_) => panic!("expected config"),
            }
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["nbprobe"]).is_err());
        }

        #[test]
        fn test_color_conversion() {
            use crate::config::ColorChoice;
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
        }
    }
}
