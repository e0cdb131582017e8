//! Lookup Engine
//! Mission: Answer PGN/SPN queries and decode PGNs into their SPN records

use crate::reference::index::ReferenceIndex;
use crate::reference::models::{J1939Dataset, PgnId, PgnRecord, SpnId, SpnRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Lookup failures, recovered at the request boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("PGN {0} does not exist in the database.")]
    PgnNotFound(PgnId),
    #[error("SPN {0} does not exist in the database.")]
    SpnNotFound(SpnId),
    #[error("PGN {pgn} references SPN {spn}, which does not exist in the database.")]
    Unresolved { pgn: PgnId, spn: SpnId },
}

/// Read-only query surface over a shared [`ReferenceIndex`]
#[derive(Debug, Clone)]
pub struct LookupEngine {
    index: Arc<ReferenceIndex>,
}

impl LookupEngine {
    pub fn new(index: Arc<ReferenceIndex>) -> Self {
        Self { index }
    }

    /// Both tables, unfiltered
    pub fn dataset(&self) -> &J1939Dataset {
        self.index.dataset()
    }

    pub fn all_pgns(&self) -> &BTreeMap<PgnId, PgnRecord> {
        self.index.pgns()
    }

    pub fn pgn(&self, id: &str) -> Result<&PgnRecord, LookupError> {
        self.index
            .pgn(id)
            .ok_or_else(|| LookupError::PgnNotFound(id.to_string()))
    }

    pub fn all_spns(&self) -> &BTreeMap<SpnId, SpnRecord> {
        self.index.spns()
    }

    pub fn spn(&self, id: &str) -> Result<&SpnRecord, LookupError> {
        self.index
            .spn(id)
            .ok_or_else(|| LookupError::SpnNotFound(id.to_string()))
    }

    /// Expand a PGN into its SPN records, in the order the PGN lists them.
    ///
    /// A single dangling SPN reference fails the whole decode; no partial list is returned.
    pub fn decode(&self, pgn_id: &str) -> Result<Vec<&SpnRecord>, LookupError> {
        let pgn = self.pgn(pgn_id)?;

        let spns = pgn
            .spns
            .iter()
            .map(|spn_ref| {
                let key = spn_ref.key();
                self.index.spn(&key).ok_or_else(|| LookupError::Unresolved {
                    pgn: pgn_id.to_string(),
                    spn: key,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Decoded PGN {} into {} SPNs", pgn_id, spns.len());
        Ok(spns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_dataset() -> J1939Dataset {
        serde_json::from_value(json!({
            "J1939PGNdb": {
                "61444": {"label": "EEC1", "SPNs": [190, 191]},
                "65262": {"label": "ET1", "SPNs": ["110"]},
                "59904": {"label": "RQST"}
            },
            "J1939SPNdb": {
                "190": {"name": "Engine Speed"},
                "191": {"name": "Transmission Output Shaft Speed"},
                "110": {"name": "Engine Coolant Temperature"}
            }
        }))
        .unwrap()
    }

    fn engine(dataset: J1939Dataset) -> LookupEngine {
        LookupEngine::new(Arc::new(ReferenceIndex::from_dataset(dataset)))
    }

    #[test]
    fn test_decode_preserves_order() {
        let engine = engine(sample_dataset());

        let spns = engine.decode("61444").unwrap();
        let names: Vec<_> = spns.iter().map(|s| s.name().unwrap()).collect();
        assert_eq!(names, vec!["Engine Speed", "Transmission Output Shaft Speed"]);
    }

    #[test]
    fn test_decode_string_references() {
        let engine = engine(sample_dataset());
        let spns = engine.decode("65262").unwrap();
        assert_eq!(spns.len(), 1);
        assert_eq!(spns[0].name(), Some("Engine Coolant Temperature"));
    }

    #[test]
    fn test_decode_pgn_without_spns() {
        let engine = engine(sample_dataset());
        assert!(engine.decode("59904").unwrap().is_empty());
    }

    #[test]
    fn test_decode_unknown_pgn() {
        let engine = engine(sample_dataset());
        assert_eq!(
            engine.decode("99999"),
            Err(LookupError::PgnNotFound("99999".to_string()))
        );
    }

    #[test]
    fn test_decode_dangling_reference_fails_whole_call() {
        let mut dataset = sample_dataset();
        dataset.spns.remove("191");
        let engine = engine(dataset);

        assert_eq!(
            engine.decode("61444"),
            Err(LookupError::Unresolved {
                pgn: "61444".to_string(),
                spn: "191".to_string(),
            })
        );
    }

    #[test]
    fn test_single_lookups() {
        let engine = engine(sample_dataset());

        assert_eq!(engine.pgn("61444").unwrap().attributes["label"], json!("EEC1"));
        assert_eq!(engine.spn("190").unwrap().name(), Some("Engine Speed"));
        assert_eq!(engine.pgn("1"), Err(LookupError::PgnNotFound("1".to_string())));
        assert_eq!(engine.spn("1"), Err(LookupError::SpnNotFound("1".to_string())));
    }

    #[test]
    fn test_bulk_lookups() {
        let engine = engine(sample_dataset());
        assert_eq!(engine.all_pgns().len(), 3);
        assert_eq!(engine.all_spns().len(), 3);
        assert_eq!(engine.dataset().pgns.len(), 3);
    }

    #[test]
    fn test_error_messages_name_identifiers() {
        let err = LookupError::Unresolved {
            pgn: "61444".to_string(),
            spn: "191".to_string(),
        };
        assert!(err.to_string().contains("61444"));
        assert!(err.to_string().contains("191"));
        assert!(LookupError::SpnNotFound("7".to_string()).to_string().contains('7'));
    }
}
