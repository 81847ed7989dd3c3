//! Repository layer: the storage capability interface and its backends.
//!
//! # Responsibility
//! - Define the primitive contract every backend implements (`VaultRepository`).
//! - Provide the embedded SQLite backend and the remote networked backend.
//!
//! # Invariants
//! - Backends are interchangeable: identical observable semantics for every
//!   primitive.
//! - No backend knows about soft-delete rules; services own them.

pub mod remote;
pub mod sqlite_repo;
pub mod vault_repo;
