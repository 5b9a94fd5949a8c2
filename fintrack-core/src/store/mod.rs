//! Encrypted, atomically written single-file document store.

mod document;
mod error;
mod json_store;
mod record;

pub use document::{Document, Settings, StructureReport, Table, TableStatus};
pub use error::{Result, StoreError};
pub use json_store::{Encoding, JsonStore, StoreOptions, ENVELOPE_PREFIX, STALE_TEMP_AGE};
pub use record::Record;
