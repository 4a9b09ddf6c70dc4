use std::marker::PhantomData;

use crate::{
    codec::{decode_payload, encode_payload},
    cursor::reverse_seek,
    domain::{Domain, KeyedDomain, SnapshotDomain},
    engine::{Engine, ReadTxn},
    error::{Result, StoreError},
    observability::timed,
    version::Version,
};

/// Domain reads bound to one read transaction, so every lookup made through
/// the same reader observes the same committed state.
pub struct SnapshotReader<'t, 'a> {
    txn: &'t ReadTxn<'a>,
}

impl<'t, 'a> SnapshotReader<'t, 'a> {
    pub(crate) fn new(txn: &'t ReadTxn<'a>) -> Self {
        Self { txn }
    }

    pub fn current_version<D: SnapshotDomain>(&self, timepoint: u64) -> Result<Version> {
        self.current_version_of(D::DOMAIN, timepoint)
    }

    pub fn current_version_of(&self, domain: Domain, timepoint: u64) -> Result<Version> {
        let mut cursor = self.txn.cursor(domain.bucket())?;
        reverse_seek(domain, timepoint, &mut cursor)
    }

    pub fn get_snapshot<D: SnapshotDomain>(&self, version: Version) -> Result<D::Payload> {
        let bytes = self.raw(D::DOMAIN, version)?;
        decode_payload(D::DOMAIN, version, &bytes)
    }

    pub fn get_one<D: KeyedDomain>(&self, key: &D::Key, version: Version) -> Result<D::Record> {
        let payload = self.get_snapshot::<D>(version)?;
        D::lookup(payload, key).ok_or_else(|| StoreError::KeyNotFound {
            domain: D::DOMAIN,
            key: key.to_string(),
            version,
        })
    }

    pub fn snapshot_at<D: SnapshotDomain>(&self, timepoint: u64) -> Result<(Version, D::Payload)> {
        let version = self.current_version::<D>(timepoint)?;
        let payload = self.get_snapshot::<D>(version)?;
        Ok((version, payload))
    }

    /// Serialized payload stored under `version`.
    pub fn raw(&self, domain: Domain, version: Version) -> Result<Vec<u8>> {
        self.txn
            .get(domain.bucket(), &version.to_key())?
            .ok_or(StoreError::VersionNotFound { domain, version })
    }
}

/// Store operations for a single domain. Each call runs in its own
/// transaction.
pub struct Snapshots<'s, D> {
    engine: &'s Engine,
    _domain: PhantomData<D>,
}

impl<'s, D: SnapshotDomain> Snapshots<'s, D> {
    pub(crate) fn new(engine: &'s Engine) -> Self {
        Self {
            engine,
            _domain: PhantomData,
        }
    }

    pub fn domain(&self) -> Domain {
        D::DOMAIN
    }

    pub fn current_version(&self, timepoint: u64) -> Result<Version> {
        timed("current_version", || {
            self.engine
                .view(|txn| SnapshotReader::new(txn).current_version::<D>(timepoint))
        })
    }

    pub fn get_snapshot(&self, version: Version) -> Result<D::Payload> {
        timed("get_snapshot", || {
            self.engine
                .view(|txn| SnapshotReader::new(txn).get_snapshot::<D>(version))
        })
    }

    pub fn snapshot_at(&self, timepoint: u64) -> Result<(Version, D::Payload)> {
        timed("snapshot_at", || {
            self.engine
                .view(|txn| SnapshotReader::new(txn).snapshot_at::<D>(timepoint))
        })
    }

    /// Writes `payload` under `timepoint`, replacing any snapshot already
    /// stored at that exact version. Returns once the write is committed.
    pub fn store_snapshot(&self, payload: &D::Payload, timepoint: u64) -> Result<()> {
        timed("store_snapshot", || {
            let key = Version::new(timepoint).to_key();
            self.engine.update(|txn| {
                let bytes = encode_payload(D::DOMAIN, payload)?;
                txn.put(D::DOMAIN.bucket(), &key, &bytes)
            })
        })
    }
}

impl<D: KeyedDomain> Snapshots<'_, D> {
    pub fn get_one(&self, key: &D::Key, version: Version) -> Result<D::Record> {
        timed("get_one", || {
            self.engine
                .view(|txn| SnapshotReader::new(txn).get_one::<D>(key, version))
        })
    }
}
