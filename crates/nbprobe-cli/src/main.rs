//! nbprobe: JupyterLab end-to-end test harness
//!
//! ## Usage
//!
//! ```bash
//! nbprobe run                              # cargo test --features browser -- --ignored
//! nbprobe run --port 8888 -- yarn test     # custom test command
//! nbprobe config --file lab.yaml           # effective page object settings
//! ```

use clap::Parser;
use nbprobe_cli::{
    init_logging, show_config, Cli, CliConfig, CliResult, Commands, HarnessRunner, Verbosity,
};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<u8> {
    let cli = Cli::parse();

    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into());
    init_logging(config.verbosity, config.color.should_color(), cli.log_json);

    match cli.command {
        Commands::Run(args) => HarnessRunner::new(config).run(&args).await,
        Commands::Config(args) => {
            print!("{}", show_config(&args)?);
            Ok(0)
        }
    }
}
