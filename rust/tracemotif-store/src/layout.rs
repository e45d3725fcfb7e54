//! Where trace and motif files live inside a data root.
//!
//! ```text
//! <root>/
//! +-- traces/<dataset>/<base_id>.trace
//! +-- motifs/<dataset>/<base_id>-motifs-<variant>.motifs
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::CodecError;

pub const TRACE_EXTENSION: &str = "trace";
pub const MOTIF_EXTENSION: &str = "motifs";

// ---------------------------------------------------------------------------
// MotifVariant
// ---------------------------------------------------------------------------

/// Whether a motif file holds raw discovery output or its pruned subset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Complete,
    Pruned,
}

/// Which view of the trace discovery ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reduction {
    None,
    Collapsed,
    FuzzyCollapsed,
}

impl Reduction {
    fn prefix(self) -> &'static str {
        match self {
            Reduction::None => "",
            Reduction::Collapsed => "collapsed-",
            Reduction::FuzzyCollapsed => "fuzzy-collapsed-",
        }
    }
}

/// One of the six motif file kinds, rendered as the file-name suffix, e.g.
/// `complete`, `collapsed-complete`, `fuzzy-collapsed-pruned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MotifVariant {
    pub stage: Stage,
    pub reduction: Reduction,
}

impl MotifVariant {
    pub const fn new(stage: Stage, reduction: Reduction) -> Self {
        Self { stage, reduction }
    }

    pub const fn complete(reduction: Reduction) -> Self {
        Self::new(Stage::Complete, reduction)
    }

    /// The pruned sibling of this variant.
    pub const fn pruned(self) -> Self {
        Self::new(Stage::Pruned, self.reduction)
    }

    pub fn all() -> impl Iterator<Item = MotifVariant> {
        [Reduction::None, Reduction::Collapsed, Reduction::FuzzyCollapsed]
            .into_iter()
            .flat_map(|r| [Self::complete(r), Self::complete(r).pruned()])
    }

    pub fn suffix(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MotifVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.reduction.prefix(), self.stage)
    }
}

impl FromStr for MotifVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reduction, stage) = if let Some(rest) = s.strip_prefix(Reduction::FuzzyCollapsed.prefix()) {
            (Reduction::FuzzyCollapsed, rest)
        } else if let Some(rest) = s.strip_prefix(Reduction::Collapsed.prefix()) {
            (Reduction::Collapsed, rest)
        } else {
            (Reduction::None, s)
        };
        let stage = stage
            .parse()
            .map_err(|_| format!("invalid motif variant: '{}'", s))?;
        Ok(Self::new(stage, reduction))
    }
}

// ---------------------------------------------------------------------------
// DatasetLayout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.data_root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trace_dir(&self, dataset: &str) -> PathBuf {
        self.root.join("traces").join(dataset)
    }

    pub fn motif_dir(&self, dataset: &str) -> PathBuf {
        self.root.join("motifs").join(dataset)
    }

    pub fn trace_path(&self, dataset: &str, base_id: &str) -> PathBuf {
        self.trace_dir(dataset)
            .join(format!("{}.{}", base_id, TRACE_EXTENSION))
    }

    pub fn motif_path(&self, dataset: &str, base_id: &str, variant: MotifVariant) -> PathBuf {
        self.motif_dir(dataset)
            .join(format!("{}-motifs-{}.{}", base_id, variant, MOTIF_EXTENSION))
    }

    /// Every `.trace` file of `dataset`, sorted by path. A dataset without a
    /// trace directory has no traces.
    pub fn list_traces(&self, dataset: &str) -> Result<Vec<PathBuf>, CodecError> {
        let dir = self.trace_dir(dataset);
        if !dir.is_dir() {
            debug!(dataset, dir = %dir.display(), "no trace directory");
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| CodecError::io(&dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CodecError::io(&dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == TRACE_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// The `base_id` a trace file was written under.
    pub fn base_id_of(path: &Path) -> Option<&str> {
        path.file_stem().and_then(|s| s.to_str())
    }
}
