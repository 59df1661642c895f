//! Offline-first delivery of mistake records.
//!
//! Records are appended to a persisted local queue and flushed to the remote
//! store in batches. A record leaves the queue only after the remote store has
//! accepted the batch containing it, so an interrupted flush is recovered by
//! the next one.

mod config;
mod manager;
mod queue;

pub use config::SyncConfig;
pub use manager::{FlushOutcome, MistakeSyncManager};
pub use queue::MistakeQueue;
