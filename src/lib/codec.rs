use serde::{Serialize, de::DeserializeOwned};

use crate::{
    domain::Domain,
    error::{Result, StoreError},
    version::Version,
};

/// Serializes `payload` and checks the bytes decode back into `T`.
/// serde_json writes NaN and infinite floats as `null`, which `f64` fields
/// cannot read back.
pub fn encode_payload<T>(domain: Domain, payload: &T) -> Result<Vec<u8>>
where
    T: Serialize + DeserializeOwned,
{
    let encode_error = |source: serde_json::Error| StoreError::Encode { domain, source };
    let bytes = serde_json::to_vec(payload).map_err(encode_error)?;
    serde_json::from_slice::<T>(&bytes).map_err(encode_error)?;
    Ok(bytes)
}

pub fn decode_payload<T>(domain: Domain, version: Version, bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(bytes).map_err(|source| StoreError::Decode {
        domain,
        version,
        source,
    })
}
