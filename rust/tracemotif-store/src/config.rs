//! Store configuration loaded from `tracemotif.toml`.
//!
//! Searches the current directory and then its ancestors, falling back to
//! the built-in defaults when no file is found.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "tracemotif.toml";

/// Byte widths of the fixed-width string fields in a trace file.
///
/// `label_width` applies to function labels; every other string field
/// (request type, base id, node id, variants) uses `string_width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWidths {
    pub string_width: usize,
    pub label_width: usize,
}

impl FieldWidths {
    pub const OPENSTACK: FieldWidths = FieldWidths {
        string_width: 48,
        label_width: 196,
    };

    pub const XTRACE: FieldWidths = FieldWidths {
        string_width: 32,
        label_width: 64,
    };
}

impl Default for FieldWidths {
    fn default() -> Self {
        Self::OPENSTACK
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `traces/` and `motifs/`.
    pub data_root: PathBuf,
    pub cache_dir: PathBuf,
    pub datasets: BTreeMap<String, FieldWidths>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let mut datasets = BTreeMap::new();
        datasets.insert("openstack".to_string(), FieldWidths::OPENSTACK);
        datasets.insert("xtrace".to_string(), FieldWidths::XTRACE);
        Self {
            data_root: PathBuf::from("."),
            cache_dir: PathBuf::from(".tracemotif-cache"),
            datasets,
        }
    }
}

impl StoreConfig {
    /// Load from the nearest `tracemotif.toml`, or defaults when none exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no {} found, using defaults", CONFIG_FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    /// Load a specific file. Relative `data_root` and `cache_dir` are
    /// resolved against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        if let Some(dir) = path.parent() {
            cfg.data_root = dir.join(&cfg.data_root);
            cfg.cache_dir = dir.join(&cfg.cache_dir);
        }
        debug!(path = %path.display(), datasets = cfg.datasets.len(), "loaded store config");
        Ok(cfg)
    }

    /// Parse a TOML string directly. Paths are left as written.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn find() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        cwd.ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (dataset, widths) in &self.datasets {
            for (field, width) in [
                ("string_width", widths.string_width),
                ("label_width", widths.label_width),
            ] {
                if width == 0 {
                    return Err(ConfigError::ZeroWidth {
                        dataset: dataset.clone(),
                        field,
                    });
                }
            }
        }
        Ok(())
    }

    /// Field widths for `dataset`; unknown datasets use the OpenStack profile.
    pub fn widths(&self, dataset: &str) -> FieldWidths {
        self.datasets.get(dataset).copied().unwrap_or_default()
    }
}
