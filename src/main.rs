mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reservedb::config::load_or_default;

use crate::commands::{
    config::ConfigArgs,
    snapshots::{GetArgs, PutArgs, ShowArgs, VersionArgs},
};

#[derive(Parser)]
#[command(author, version, about = "Versioned snapshot store for reserve data")]
struct Cli {
    /// Path to the configuration file. Defaults to ~/.reservedb/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration file and the snapshot store
    Init,
    /// Update configuration
    Config(ConfigArgs),
    /// Print the snapshot version in effect at a timepoint
    Version(VersionArgs),
    /// Print a snapshot as JSON
    Show(ShowArgs),
    /// Print one record of a prices or balances snapshot
    Get(GetArgs),
    /// Store a JSON snapshot read from a file or stdin
    Put(PutArgs),
    /// Print the number of stored snapshots per domain
    Stats,
}

fn main() -> Result<()> {
    let Cli { config, command } = Cli::parse();
    let (config, config_path) = load_or_default(config)?;
    logging::init(&config.logs_path())?;

    match command {
        Commands::Init => commands::system::init(&config, &config_path)?,
        Commands::Config(args) => commands::config::execute(config, &config_path, args)?,
        Commands::Version(args) => commands::snapshots::version(&config, args)?,
        Commands::Show(args) => commands::snapshots::show(&config, args)?,
        Commands::Get(args) => commands::snapshots::get(&config, args)?,
        Commands::Put(args) => commands::snapshots::put(&config, args)?,
        Commands::Stats => commands::system::stats(&config)?,
    }

    Ok(())
}
