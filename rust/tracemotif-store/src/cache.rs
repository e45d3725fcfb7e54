//! Content-addressed cache for derived motif artifacts.
//!
//! Replaces "skip if the output file exists" checks: an artifact is reused
//! only when it was produced from byte-identical input for the same trace
//! and algorithm variant.
//!
//! ## Cache Structure
//!
//! ```text
//! <cache_dir>/
//! +-- index.json           # key -> entry metadata
//! +-- artifacts/
//!     +-- <hex_key>.bin    # artifact bytes
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracemotif_core::{MotifSet, TraceGraph};
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::layout::MotifVariant;
use crate::motif_codec::{decode_motifs, encode_motifs};

// =============================================================================
// ArtifactKey
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub base_id: String,
    pub variant: MotifVariant,
    /// SHA-256 hex digest of the input bytes.
    pub input_digest: String,
}

impl ArtifactKey {
    pub fn new(base_id: impl Into<String>, variant: MotifVariant, input: &[u8]) -> Self {
        Self {
            base_id: base_id.into(),
            variant,
            input_digest: sha256_hex(input),
        }
    }

    /// Canonical hex name used for the index and the artifact file.
    pub fn to_hex(&self) -> String {
        let combined = format!("{}:{}:{}", self.base_id, self.variant, self.input_digest);
        sha256_hex(combined.as_bytes())
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "{}/{}@{}", self.base_id, self.variant, &hex[..12])
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut s = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(s, "{:02x}", b);
    }
    s
}

// =============================================================================
// ArtifactCache
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: ArtifactKey,
    /// Relative to the cache directory.
    pub artifact_path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug)]
pub struct ArtifactCache {
    dir: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl ArtifactCache {
    /// Open (creating if needed) the cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(dir.join("artifacts")).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        let entries = Self::load_index(&dir)?;
        debug!(dir = %dir.display(), entries = entries.len(), "opened artifact cache");
        Ok(Self { dir, entries })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.entries.contains_key(&key.to_hex())
    }

    /// The cached bytes for `key`, or `None` on a miss. An indexed entry whose
    /// file has gone missing is a miss.
    pub fn get(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>, CacheError> {
        let Some(entry) = self.entries.get(&key.to_hex()) else {
            return Ok(None);
        };
        let path = self.dir.join(&entry.artifact_path);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Store `bytes` under `key`, replacing any previous artifact.
    pub fn put(&mut self, key: ArtifactKey, bytes: &[u8]) -> Result<(), CacheError> {
        let hex = key.to_hex();
        let relative = PathBuf::from("artifacts").join(format!("{}.bin", hex));
        atomic_write(&self.dir.join(&relative), bytes)?;
        self.entries.insert(
            hex,
            CacheEntry {
                key,
                artifact_path: relative,
                size_bytes: bytes.len() as u64,
            },
        );
        self.save_index()
    }

    /// Drop `key`. Returns `true` if it was present.
    pub fn invalidate(&mut self, key: &ArtifactKey) -> Result<bool, CacheError> {
        let Some(entry) = self.entries.remove(&key.to_hex()) else {
            return Ok(false);
        };
        let _ = std::fs::remove_file(self.dir.join(&entry.artifact_path));
        self.save_index()?;
        Ok(true)
    }

    fn load_index(dir: &Path) -> Result<BTreeMap<String, CacheEntry>, CacheError> {
        let path = dir.join("index.json");
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| CacheError::Io { path, source })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_index(&self) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        atomic_write(&self.dir.join("index.json"), json.as_bytes())
    }
}

/// Write to a `.tmp` sibling, then rename into place.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).map_err(|source| CacheError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// Cached pruning
// =============================================================================

/// Prune `raw`, reusing a cached result computed from identical input.
///
/// `variant` names the raw set's discovery variant; the result is stored
/// under its pruned sibling.
pub fn prune_with_cache(
    cache: &mut ArtifactCache,
    raw: &MotifSet,
    graph: &TraceGraph,
    variant: MotifVariant,
) -> Result<MotifSet, CacheError> {
    let input = encode_motifs(raw)?;
    let key = ArtifactKey::new(raw.base_id(), variant.pruned(), &input);

    if let Some(bytes) = cache.get(&key)? {
        match decode_motifs(&bytes, graph) {
            Ok(set) => {
                debug!(key = %key, "pruned motifs served from cache");
                return Ok(set);
            }
            Err(err) => warn!(key = %key, error = %err, "discarding unreadable cache entry"),
        }
    }

    let pruned = raw.pruned();
    cache.put(key, &encode_motifs(&pruned)?)?;
    info!(
        base_id = %raw.base_id(),
        variant = %variant.pruned(),
        kept = pruned.len(),
        total = raw.len(),
        "pruned motif set"
    );
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Reduction;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tracemotif-cache-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn key_depends_on_every_component() {
        let v = MotifVariant::complete(Reduction::None);
        let base = ArtifactKey::new("t", v, b"abc");
        assert_eq!(base.to_hex(), ArtifactKey::new("t", v, b"abc").to_hex());
        assert_ne!(base.to_hex(), ArtifactKey::new("u", v, b"abc").to_hex());
        assert_ne!(base.to_hex(), ArtifactKey::new("t", v.pruned(), b"abc").to_hex());
        assert_ne!(base.to_hex(), ArtifactKey::new("t", v, b"abd").to_hex());
        assert_eq!(base.to_hex().len(), 64);
    }

    #[test]
    fn put_get_invalidate_and_reopen() {
        let dir = temp_dir();
        let key = ArtifactKey::new("t", MotifVariant::complete(Reduction::Collapsed), b"in");
        {
            let mut cache = ArtifactCache::open(&dir).unwrap();
            assert!(cache.get(&key).unwrap().is_none());
            cache.put(key.clone(), b"out").unwrap();
            assert!(cache.contains(&key));
        }

        let mut cache = ArtifactCache::open(&dir).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap(), Some(b"out".to_vec()));
        assert!(!dir.join("index.tmp").exists());

        assert!(cache.invalidate(&key).unwrap());
        assert!(!cache.invalidate(&key).unwrap());
        assert!(cache.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_artifact_file_is_a_miss() {
        let dir = temp_dir();
        let key = ArtifactKey::new("t", MotifVariant::complete(Reduction::None), b"in");
        let mut cache = ArtifactCache::open(&dir).unwrap();
        cache.put(key.clone(), b"out").unwrap();
        std::fs::remove_file(dir.join("artifacts").join(format!("{}.bin", key.to_hex()))).unwrap();
        assert!(cache.get(&key).unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
