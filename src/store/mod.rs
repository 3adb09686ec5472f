pub mod json_store;
pub mod kv;
pub mod progress;
pub mod schema;

use thiserror::Error;

pub use json_store::JsonStore;
pub use kv::{KvStore, MemoryKvStore};
pub use progress::{ProgressStore, StoreStats};
pub use schema::{Collection, PendingSessionRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),
}
