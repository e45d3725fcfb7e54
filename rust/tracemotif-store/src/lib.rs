//! tracemotif store
//!
//! Fixed-layout binary files for traces and motif sets, the dataset
//! directory layout they live in, a content-addressed cache for derived
//! artifacts, and `tracemotif.toml` configuration.

pub mod cache;
pub mod config;
pub mod error;
pub mod layout;
pub mod motif_codec;
pub mod trace_codec;
mod wire;

pub use cache::{prune_with_cache, ArtifactCache, ArtifactKey};
pub use config::{FieldWidths, StoreConfig};
pub use error::{CacheError, CodecError, ConfigError};
pub use layout::{DatasetLayout, MotifVariant, Reduction, Stage};
pub use motif_codec::{decode_motifs, encode_motifs, read_motifs, read_motifs_optional, write_motifs};
pub use trace_codec::{decode_trace, encode_trace, read_trace, write_trace};
