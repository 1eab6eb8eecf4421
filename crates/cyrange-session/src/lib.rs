//! Training session orchestration and storage.
//!
//! Provides:
//! - `TrainingManager` - Create and end training sessions
//! - `SessionStore` - Lock-guarded store with range id reservation
//! - Storage implementations (memory, JSON file)

pub mod error;
pub mod manager;
pub mod storage;
pub mod store;

pub use error::{ErrorKind, TrainingError};
pub use manager::{CreateTrainingRequest, TrainingCreated, TrainingManager};
pub use store::{SessionStore, StoreError, Transaction};
