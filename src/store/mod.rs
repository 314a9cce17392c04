//! Client-side persistence: the key-value abstraction and the
//! authentication state container built on top of it.

pub mod auth;
pub mod kv;

pub use auth::{AuthSession, AuthStore};
pub use kv::{FileStore, KeyValueStore, MemoryStore, StoreError};
