#![forbid(unsafe_code)]

pub mod keys;
pub mod local_state;
pub mod question_bank;
pub mod repository;
pub mod sqlite;

pub use local_state::LocalState;
pub use repository::{InMemoryKeyValueStore, KeyValueStore, Storage, StorageError};
