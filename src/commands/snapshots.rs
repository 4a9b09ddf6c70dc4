use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args};
use reservedb::{
    Balances, Domain, Prices, SnapshotStore, Version, config::Config, model::TokenPairId,
};
use serde_json::Value;

use crate::commands::{open_for_read, open_for_write};

#[derive(Args)]
pub struct VersionArgs {
    /// Domain: prices, balances, exchange-balances or rates
    pub domain: Domain,

    /// Timepoint to resolve
    #[arg(long)]
    pub at: u64,
}

#[derive(Args)]
#[command(group(ArgGroup::new("selector").required(true).args(["version", "at"])))]
pub struct ShowArgs {
    pub domain: Domain,

    /// Exact snapshot version
    #[arg(long)]
    pub version: Option<u64>,

    /// Show the snapshot in effect at this timepoint
    #[arg(long)]
    pub at: Option<u64>,
}

#[derive(Args)]
pub struct GetArgs {
    /// Domain: prices or balances
    pub domain: Domain,

    /// Token pair (prices) or account/token key (balances)
    pub key: String,

    #[arg(long)]
    pub version: u64,
}

#[derive(Args)]
pub struct PutArgs {
    pub domain: Domain,

    /// Timepoint to store the snapshot under
    #[arg(long)]
    pub at: u64,

    /// JSON payload file; reads stdin when omitted
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn version(config: &Config, args: VersionArgs) -> Result<()> {
    let store = open_for_read(config)?;
    let version = store.current_version_of(args.domain, args.at)?;
    println!("{version}");
    Ok(())
}

pub fn show(config: &Config, args: ShowArgs) -> Result<()> {
    let store = open_for_read(config)?;
    let version = resolve_version(&store, args.domain, args.version, args.at)?;
    let snapshot = store.snapshot_json(args.domain, version)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub fn get(config: &Config, args: GetArgs) -> Result<()> {
    let store = open_for_read(config)?;
    let version = Version::new(args.version);
    let record = match args.domain {
        Domain::Prices => {
            let pair = TokenPairId::from(args.key);
            serde_json::to_value(store.get_one::<Prices>(&pair, version)?)?
        }
        Domain::Balances => serde_json::to_value(store.get_one::<Balances>(&args.key, version)?)?,
        other => bail!("single-record lookup is not available for {other} snapshots"),
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn put(config: &Config, args: PutArgs) -> Result<()> {
    let raw = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read payload from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read payload from stdin")?;
            buffer
        }
    };
    let payload: Value = serde_json::from_str(&raw).context("payload is not valid JSON")?;

    let store = open_for_write(config)?;
    store.store_json(args.domain, payload, args.at)?;
    tracing::info!(domain = %args.domain, version = args.at, "snapshot stored");
    Ok(())
}

fn resolve_version(
    store: &SnapshotStore,
    domain: Domain,
    version: Option<u64>,
    at: Option<u64>,
) -> Result<Version> {
    match (version, at) {
        (Some(version), _) => Ok(Version::new(version)),
        (None, Some(timepoint)) => Ok(store.current_version_of(domain, timepoint)?),
        (None, None) => bail!("either --version or --at is required"),
    }
}
