use crate::error::{Result, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Writes `value` to `path` as pretty JSON, used for the validator and peer
/// registries (spec.md §9: these are small, human-inspectable side tables,
/// unlike the chain log which favors a compact binary format). Generic over
/// `T` so both `node-core`'s validator map and `node-network`'s peer list
/// can share one snapshot mechanism without `node-storage` depending on
/// either crate.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Loads a value previously written by [`save_json`]. Returns `Ok(None)` if
/// the file does not exist yet, distinguishing "never snapshotted" from a
/// read error.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Option<T>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(Some(value))
}
