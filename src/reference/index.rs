//! Reference Index
//! Mission: Load the J1939 dataset once at startup into an immutable two-level index

use crate::reference::models::{J1939Dataset, PgnId, PgnRecord, SpnId, SpnRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Dataset load failures. Fatal: the service cannot start without an index.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// PGN and SPN tables keyed by identifier.
///
/// Only ever built whole, then shared read-only behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    dataset: J1939Dataset,
}

impl ReferenceIndex {
    /// Load the dataset from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let index = Self::from_reader(BufReader::new(file))?;
        info!(
            "📚 Loaded J1939 dataset from {}: {} PGNs, {} SPNs",
            path.display(),
            index.pgns().len(),
            index.spns().len()
        );
        Ok(index)
    }

    /// Parse a dataset document from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let dataset: J1939Dataset = serde_json::from_reader(reader)?;
        Ok(Self::from_dataset(dataset))
    }

    /// Build an index from an already parsed dataset
    pub fn from_dataset(dataset: J1939Dataset) -> Self {
        let dangling = dataset
            .pgns
            .values()
            .flat_map(|pgn| pgn.spns.iter())
            .filter(|spn| !dataset.spns.contains_key(&spn.key()))
            .count();

        if dangling > 0 {
            warn!(
                dangling,
                "⚠️  Dataset has SPN references with no SPN record; decode will fail for those PGNs"
            );
        }

        Self { dataset }
    }

    pub fn pgns(&self) -> &BTreeMap<PgnId, PgnRecord> {
        &self.dataset.pgns
    }

    pub fn spns(&self) -> &BTreeMap<SpnId, SpnRecord> {
        &self.dataset.spns
    }

    pub fn pgn(&self, id: &str) -> Option<&PgnRecord> {
        self.dataset.pgns.get(id)
    }

    pub fn spn(&self, id: &str) -> Option<&SpnRecord> {
        self.dataset.spns.get(id)
    }

    /// The whole document, as served by the bulk endpoint
    pub fn dataset(&self) -> &J1939Dataset {
        &self.dataset
    }
}
