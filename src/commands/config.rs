use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use reservedb::config::{Config, ConfigUpdate};

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Fsync every committed snapshot before returning
    #[arg(long)]
    pub sync_writes: Option<bool>,

    /// Open file limit handed to the storage engine (-1 for unlimited)
    #[arg(long, allow_negative_numbers = true)]
    pub max_open_files: Option<i32>,
}

pub fn execute(mut config: Config, path: &Path, args: ConfigArgs) -> Result<()> {
    let ConfigArgs {
        data_dir,
        sync_writes,
        max_open_files,
    } = args;

    let update = ConfigUpdate {
        data_dir,
        sync_writes,
        max_open_files,
    };
    if update.is_empty() {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    config.apply_update(update)?;
    config.ensure_data_dir()?;
    config.save(path)?;

    tracing::info!("Configuration saved to {}", path.display());
    Ok(())
}
