//! Record store primitives.
//!
//! Every consumer talks to records through [`RecordStore`]. The in-memory
//! arena backs tests and the demo backend, the HTTP store talks to a hosted
//! record service using the wire protocol in [`protocol`].

mod http;
mod memory;
pub mod protocol;
mod settings;

use async_trait::async_trait;
use entity::{Record, RecordId, ValidationError, WireError};
use thiserror::Error;

pub use http::{HttpStore, http_client};
pub use memory::InMemoryStore;
pub use settings::StoreSettings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: RecordId },
    #[error("record service rejected the request: {0}")]
    Rejected(String),
    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),
    #[error("record service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed record: {0}")]
    Decode(#[from] WireError),
    #[error("invalid store settings: {0}")]
    Settings(String),
    #[error("store state poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over one entity table. Every call may fail; none of them panic.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// All records, in the store's natural order.
    async fn get_all(&self) -> StoreResult<Vec<R>>;

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<R>>;

    /// Assigns the id and timestamps.
    async fn create(&self, draft: R::Draft) -> StoreResult<R>;

    /// Applies only the fields present in `patch` and returns the stored result.
    async fn update(&self, id: RecordId, patch: R::Patch) -> StoreResult<R>;

    async fn delete(&self, id: RecordId) -> StoreResult<()>;
}
