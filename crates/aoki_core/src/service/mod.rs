//! Use-case services over an injected vault repository.
//!
//! # Responsibility
//! - Enforce the account soft-delete lifecycle and the project delete
//!   cascade on top of primitive repository calls.
//! - Derive read-side views (active counts, trash with project names,
//!   filters).
//!
//! # Invariants
//! - Services are written once against `VaultRepository` and behave the same
//!   over every backend.
//! - Services keep no in-memory state between calls.

pub mod aggregation;
pub mod cascade;
pub mod clock;
pub mod filter;
pub mod lifecycle_service;
