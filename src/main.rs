// KratOs Privileged - Entry point
// Principle: Inspect, validate, never mutate

use clap::Parser;
use kratos_privileged::cli::runner;
use kratos_privileged::cli::{Cli, Commands, ConfigSubcommand, GenesisSubcommand};
use kratos_privileged::cli::config::standard_privilege_table;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_filter = if cli.verbose {
        "debug"
    } else {
        &cli.log_level
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .init();

    let types = Arc::new(standard_privilege_table()?);

    let result = match cli.command {
        Commands::Types => {
            runner::print_types(&types);
            Ok(())
        }

        Commands::Genesis(cmd) => match cmd.subcommand {
            GenesisSubcommand::Validate { file } => runner::validate_genesis(&file, &types),
        },

        Commands::Inspect(cmd) => runner::inspect(&cmd, types),

        Commands::Config(cmd) => match cmd.subcommand {
            ConfigSubcommand::Init { output, force } => runner::init_config(&output, force),
        },
    };

    if let Err(ref e) = result {
        error!("{:#}", e);
    }
    result
}
