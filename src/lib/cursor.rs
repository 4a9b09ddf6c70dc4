use crate::{
    domain::Domain,
    error::{Result, StoreError},
    version::Version,
};

/// Ordered cursor over one bucket's version keys.
///
/// `seek` positions on the first key greater than or equal to the target and
/// returns it, or `None` when every key is smaller. `prev` steps back one key
/// from the current position; after a `seek` that ran off the end it lands on
/// the last key of the bucket.
pub trait VersionCursor {
    fn seek(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn prev(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Finds the greatest stored version that is less than or equal to
/// `timepoint`.
pub fn reverse_seek<C>(domain: Domain, timepoint: u64, cursor: &mut C) -> Result<Version>
where
    C: VersionCursor + ?Sized,
{
    let target = Version::new(timepoint);
    if let Some(key) = cursor.seek(&target.to_key())? {
        let found = Version::from_key(&key)?;
        if found == target {
            return Ok(found);
        }
    }

    match cursor.prev()? {
        Some(key) => Version::from_key(&key),
        None => Err(StoreError::NoDataBeforeTimepoint { domain, timepoint }),
    }
}
