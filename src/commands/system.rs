use std::path::Path;

use anyhow::Result;
use reservedb::{Domain, config::Config};

use crate::commands::{open_for_read, open_for_write};

pub fn init(config: &Config, config_path: &Path) -> Result<()> {
    let store = open_for_write(config)?;
    tracing::info!(
        config = %config_path.display(),
        store = %store.path().display(),
        "snapshot store initialised"
    );
    println!("{}", store.path().display());
    Ok(())
}

pub fn stats(config: &Config) -> Result<()> {
    let store = open_for_read(config)?;
    let counts = store.counts()?;
    for domain in Domain::ALL {
        println!("{:<18} {}", domain, counts.get(domain));
    }
    println!("{:<18} {}", "total", counts.total());
    Ok(())
}
