//! Versioned snapshot store.
//!
//! Four independent domains (prices, balances, exchange balances and rates)
//! are persisted as immutable snapshots keyed by the timepoint they were taken
//! at. Readers either ask for an exact version or for the version in effect at
//! a timepoint, which resolves to the greatest stored version not after it.
//!
//! Each domain lives in its own bucket. Data written by older tooling that
//! read balances and exchange balances back out of the prices bucket is not
//! reinterpreted here; every domain reads only what was written to it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::{
    codec::decode_payload,
    config::Config,
    domain::{
        Balances, Domain, ExchangeBalances, KeyedDomain, Prices, Rates, SnapshotDomain,
    },
    engine::{Engine, EngineOptions},
    error::{Result, StoreError},
    observability,
    snapshot::{SnapshotReader, Snapshots},
    version::Version,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub prices: u64,
    pub balances: u64,
    pub exchange_balances: u64,
    pub rates: u64,
}

impl StoreCounts {
    pub fn get(&self, domain: Domain) -> u64 {
        match domain {
            Domain::Prices => self.prices,
            Domain::Balances => self.balances,
            Domain::ExchangeBalances => self.exchange_balances,
            Domain::Rates => self.rates,
        }
    }

    pub fn total(&self) -> u64 {
        self.prices + self.balances + self.exchange_balances + self.rates
    }
}

pub struct SnapshotStore {
    engine: Engine,
}

impl SnapshotStore {
    /// Opens or creates a store with default engine options. All four domain
    /// buckets exist once this returns.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &EngineOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &EngineOptions) -> Result<Self> {
        observability::describe();
        let engine = Engine::open(path.as_ref(), Domain::buckets(), options)?;
        Ok(Self { engine })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.ensure_data_dir()?;
        Self::open_with(config.store_path(), &config.engine_options())
    }

    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        observability::describe();
        let engine = Engine::open_read_only(path.as_ref(), Domain::buckets())?;
        Ok(Self { engine })
    }

    pub fn path(&self) -> PathBuf {
        self.engine.path().to_path_buf()
    }

    pub fn is_read_only(&self) -> bool {
        self.engine.is_read_only()
    }

    pub fn domain<D: SnapshotDomain>(&self) -> Snapshots<'_, D> {
        Snapshots::new(&self.engine)
    }

    pub fn prices(&self) -> Snapshots<'_, Prices> {
        self.domain()
    }

    pub fn balances(&self) -> Snapshots<'_, Balances> {
        self.domain()
    }

    pub fn exchange_balances(&self) -> Snapshots<'_, ExchangeBalances> {
        self.domain()
    }

    pub fn rates(&self) -> Snapshots<'_, Rates> {
        self.domain()
    }

    pub fn current_version<D: SnapshotDomain>(&self, timepoint: u64) -> Result<Version> {
        self.domain::<D>().current_version(timepoint)
    }

    pub fn get_snapshot<D: SnapshotDomain>(&self, version: Version) -> Result<D::Payload> {
        self.domain::<D>().get_snapshot(version)
    }

    pub fn get_one<D: KeyedDomain>(&self, key: &D::Key, version: Version) -> Result<D::Record> {
        self.domain::<D>().get_one(key, version)
    }

    pub fn store_snapshot<D: SnapshotDomain>(
        &self,
        payload: &D::Payload,
        timepoint: u64,
    ) -> Result<()> {
        self.domain::<D>().store_snapshot(payload, timepoint)
    }

    pub fn snapshot_at<D: SnapshotDomain>(&self, timepoint: u64) -> Result<(Version, D::Payload)> {
        self.domain::<D>().snapshot_at(timepoint)
    }

    /// Runs `f` against one consistent read transaction spanning every domain.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SnapshotReader<'_, '_>) -> Result<T>,
    {
        self.engine.view(|txn| f(&SnapshotReader::new(txn)))
    }

    pub fn current_version_of(&self, domain: Domain, timepoint: u64) -> Result<Version> {
        self.view(|reader| reader.current_version_of(domain, timepoint))
    }

    /// Snapshot at `version` as untyped JSON, after checking it decodes into
    /// the domain's payload shape.
    pub fn snapshot_json(&self, domain: Domain, version: Version) -> Result<Value> {
        let bytes = self.view(|reader| reader.raw(domain, version))?;
        match domain {
            Domain::Prices => typed_json::<Prices>(version, &bytes),
            Domain::Balances => typed_json::<Balances>(version, &bytes),
            Domain::ExchangeBalances => typed_json::<ExchangeBalances>(version, &bytes),
            Domain::Rates => typed_json::<Rates>(version, &bytes),
        }
    }

    /// Stores untyped JSON, rejecting values that do not match the domain's
    /// payload shape.
    pub fn store_json(&self, domain: Domain, payload: Value, timepoint: u64) -> Result<()> {
        match domain {
            Domain::Prices => self.store_value::<Prices>(payload, timepoint),
            Domain::Balances => self.store_value::<Balances>(payload, timepoint),
            Domain::ExchangeBalances => self.store_value::<ExchangeBalances>(payload, timepoint),
            Domain::Rates => self.store_value::<Rates>(payload, timepoint),
        }
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        self.engine.view(|txn| {
            Ok(StoreCounts {
                prices: txn.count(Domain::Prices.bucket())?,
                balances: txn.count(Domain::Balances.bucket())?,
                exchange_balances: txn.count(Domain::ExchangeBalances.bucket())?,
                rates: txn.count(Domain::Rates.bucket())?,
            })
        })
    }

    fn store_value<D: SnapshotDomain>(&self, payload: Value, timepoint: u64) -> Result<()> {
        let typed: D::Payload =
            serde_json::from_value(payload).map_err(|source| StoreError::InvalidPayload {
                domain: D::DOMAIN,
                source,
            })?;
        self.store_snapshot::<D>(&typed, timepoint)
    }
}

fn typed_json<D: SnapshotDomain>(version: Version, bytes: &[u8]) -> Result<Value> {
    let payload: D::Payload = decode_payload(D::DOMAIN, version, bytes)?;
    serde_json::to_value(&payload).map_err(|source| StoreError::Encode {
        domain: D::DOMAIN,
        source,
    })
}
