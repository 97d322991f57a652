//! Key-value persistence for the storefront session.
//!
//! This crate provides:
//! - The `KeyValueStore` trait with batched writes
//! - An in-memory store and a file-backed store
//! - The well-known keys of the persisted layout
//! - Typed JSON helpers over any store

pub mod error;
pub mod file;
pub mod json;
pub mod keys;
pub mod memory;
pub mod store;

pub use error::{Result, StorageError};
pub use file::FileStore;
pub use json::JsonStoreExt;
pub use memory::InMemoryStore;
pub use store::{KeyValueStore, StoreWrite};
