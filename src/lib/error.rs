use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{domain::Domain, version::Version};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to initialise store at {}: {reason}", .path.display())]
    StoreInit { path: PathBuf, reason: String },
    #[error("there is no {domain} data before timepoint {timepoint}")]
    NoDataBeforeTimepoint { domain: Domain, timepoint: u64 },
    #[error("{domain} version {version} doesn't exist")]
    VersionNotFound { domain: Domain, version: Version },
    #[error("{domain} snapshot at version {version} has no entry for {key}")]
    KeyNotFound {
        domain: Domain,
        key: String,
        version: Version,
    },
    #[error("malformed version key: expected 8 bytes, found {len}")]
    MalformedKey { len: usize },
    #[error("failed to decode {domain} snapshot at version {version}: {source}")]
    Decode {
        domain: Domain,
        version: Version,
        source: serde_json::Error,
    },
    #[error("failed to encode {domain} snapshot: {source}")]
    Encode {
        domain: Domain,
        source: serde_json::Error,
    },
    #[error("payload is not a valid {domain} snapshot: {source}")]
    InvalidPayload {
        domain: Domain,
        source: serde_json::Error,
    },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("store opened in read-only mode")]
    ReadOnly,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse grouping used by callers that only need to know whether data is
/// missing, damaged, rejected on the way in, or whether the engine failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Absence,
    Corruption,
    /// The caller's payload was rejected before anything was written.
    Invalid,
    Engine,
    Configuration,
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoDataBeforeTimepoint { .. }
            | Self::VersionNotFound { .. }
            | Self::KeyNotFound { .. } => ErrorClass::Absence,
            Self::MalformedKey { .. } | Self::Decode { .. } => ErrorClass::Corruption,
            Self::Encode { .. } | Self::InvalidPayload { .. } => ErrorClass::Invalid,
            Self::StoreInit { .. } | Self::Storage(_) | Self::ReadOnly | Self::Io(_) => {
                ErrorClass::Engine
            }
            Self::Config(_) | Self::Serialization(_) => ErrorClass::Configuration,
        }
    }

    pub fn is_absence(&self) -> bool {
        self.class() == ErrorClass::Absence
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub(crate) fn map_db_error(err: rocksdb::Error) -> StoreError {
    StoreError::Storage(err.to_string())
}
