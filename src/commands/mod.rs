use anyhow::{Context, Result};
use reservedb::{SnapshotStore, config::Config};

pub mod config;
pub mod snapshots;
pub mod system;

/// Opens the store without taking the write lock, for commands that only read.
pub(crate) fn open_for_read(config: &Config) -> Result<SnapshotStore> {
    let path = config.store_path();
    SnapshotStore::open_read_only(&path).with_context(|| {
        format!(
            "unable to open snapshot store at {} (run `reservedb init` first)",
            path.display()
        )
    })
}

pub(crate) fn open_for_write(config: &Config) -> Result<SnapshotStore> {
    SnapshotStore::from_config(config).with_context(|| {
        format!(
            "unable to open snapshot store at {}",
            config.store_path().display()
        )
    })
}
