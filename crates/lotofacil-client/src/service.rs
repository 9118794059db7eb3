pub mod results;
pub mod sync;

pub use results::{DEFAULT_RESULTS_LIMIT, MAX_RESULTS_LIMIT, parse_limit};
pub use sync::{DrawOutcome, DrawSyncResult, SyncError, SyncSummary, Synchronizer};
