//! J1939 Reference Module
//! Mission: Serve PGN/SPN lookups from an index loaded once at startup

pub mod index;
pub mod lookup;
pub mod models;

pub use index::{LoadError, ReferenceIndex};
pub use lookup::{LookupEngine, LookupError};
