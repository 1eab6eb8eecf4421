//! Storage implementations.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "memory")]
pub use memory::MemoryStorage;

#[cfg(feature = "file")]
pub use file::JsonFileStorage;
