//! J1939 Reference Models
//! Mission: Describe PGN and SPN records as they appear in the dataset

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter group number, the parent key of the dataset
pub type PgnId = String;

/// Suspect parameter number, the child key of the dataset
pub type SpnId = String;

/// Reference to an SPN embedded in a PGN record.
///
/// The dataset lists SPNs as bare numbers, but string entries are accepted too.
/// Both resolve against the SPN table by their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpnRef {
    Number(u64),
    Text(String),
}

impl SpnRef {
    /// Key used to look the SPN up in the child table
    pub fn key(&self) -> SpnId {
        match self {
            SpnRef::Number(n) => n.to_string(),
            SpnRef::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for SpnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpnRef::Number(n) => write!(f, "{}", n),
            SpnRef::Text(s) => f.write_str(s),
        }
    }
}

/// A PGN record: descriptive attributes plus the ordered SPNs it carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgnRecord {
    #[serde(rename = "SPNs", default)]
    pub spns: Vec<SpnRef>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// An SPN record. Attributes are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpnRecord {
    pub attributes: Map<String, Value>,
}

impl SpnRecord {
    /// Human readable name, when the record carries one
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }
}

/// The on-disk document shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct J1939Dataset {
    #[serde(rename = "J1939PGNdb")]
    pub pgns: BTreeMap<PgnId, PgnRecord>,
    #[serde(rename = "J1939SPNdb")]
    pub spns: BTreeMap<SpnId, SpnRecord>,
}
