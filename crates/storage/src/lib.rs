use common::models::SignalError;
use thiserror::Error;

pub mod db;
pub mod memory_store;
pub mod repositories;

pub use memory_store::MemoryHistoryStore;
pub use repositories::HistoryRepository;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Corrupt history record: {0}")]
    Corrupt(#[from] SignalError),
}
