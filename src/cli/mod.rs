// CLI - Command line interface for privileged contract tooling
// Principle: Read-only inspection, nothing here mutates chain state

pub mod config;
pub mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// KratOs privileged contracts - registry inspection and genesis tooling
#[derive(Parser, Debug)]
#[command(name = "kratos-privileged")]
#[command(author = "KratOs Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and validate the KratOs privileged contract registry")]
#[command(long_about = r#"
Privileged contracts receive begin/end-of-block callbacks and may execute
governance actions or mint tokens once they hold the matching privilege.

List the privilege types known to this build:
  kratos-privileged types

Check a genesis dump before launching a chain:
  kratos-privileged genesis validate ./privileged-genesis.json

Look at the registry of a stopped node:
  kratos-privileged inspect --db ~/.local/share/kratos/privileged
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "KRATOS_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the privilege type table
    Types,

    /// Genesis file tooling
    Genesis(GenesisCmd),

    /// List privileged contracts and registrations from a node database
    Inspect(InspectCmd),

    /// Configuration file tooling
    Config(ConfigCmd),
}

#[derive(Parser, Debug)]
pub struct GenesisCmd {
    #[command(subcommand)]
    pub subcommand: GenesisSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum GenesisSubcommand {
    /// Load a genesis JSON file and check it against the privilege table
    Validate {
        /// Path to the genesis file
        file: PathBuf,
    },
}

#[derive(Parser, Debug)]
pub struct InspectCmd {
    /// Database path (defaults to the kratos data directory)
    #[arg(short = 'd', long, env = "KRATOS_PRIVILEGED_DB")]
    pub db: Option<PathBuf>,

    /// Only list registrations of this privilege type
    #[arg(long)]
    pub privilege: Option<String>,
}

impl InspectCmd {
    /// Get the database path
    pub fn get_db_path(&self) -> PathBuf {
        if let Some(ref path) = self.db {
            path.clone()
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("kratos")
                .join("privileged")
        }
    }
}

#[derive(Parser, Debug)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub subcommand: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Write a default configuration file
    Init {
        /// Output file
        #[arg(short, long, default_value = "privileged.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["kratos-privileged", "inspect", "--db", "/tmp/db", "--privilege", "end_blocker"]).unwrap();
        match cli.command {
            Commands::Inspect(cmd) => {
                assert_eq!(cmd.get_db_path(), PathBuf::from("/tmp/db"));
                assert_eq!(cmd.privilege.as_deref(), Some("end_blocker"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["kratos-privileged", "types", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Types));
    }

    #[test]
    fn test_default_db_path_under_kratos_dir() {
        let cmd = InspectCmd {
            db: None,
            privilege: None,
        };
        assert!(cmd.get_db_path().ends_with("kratos/privileged"));
    }
}
