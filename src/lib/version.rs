use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

pub const VERSION_KEY_LEN: usize = 8;

/// Timepoint under which a snapshot is stored. Encoded big-endian so the
/// engine's byte ordering matches numeric ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub fn to_key(self) -> [u8; VERSION_KEY_LEN] {
        self.0.to_be_bytes()
    }

    pub fn from_key(key: &[u8]) -> Result<Self> {
        let bytes: [u8; VERSION_KEY_LEN] = key
            .try_into()
            .map_err(|_| StoreError::MalformedKey { len: key.len() })?;
        Ok(Self(u64::from_be_bytes(bytes)))
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(value: Version) -> Self {
        value.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
