//! # Staffdesk Storage
//!
//! Durable key/value storage for Staffdesk client state.
//!
//! Provides the [`StorageBackend`] trait, its error type and an in-memory
//! backend for tests and ephemeral sessions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod memory;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use memory::MemoryBackend;
