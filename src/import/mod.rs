pub mod ingest;
pub mod watcher;

pub use ingest::{ingest_payload, ingest_value, ImportReport, RecordOutcome};
pub use watcher::{ImportWatcher, ScanReport};
