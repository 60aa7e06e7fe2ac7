//! Wine record storage for Cantina.
//!
//! This crate provides the persistence boundary for wine records: a store
//! trait, an in-memory backend, a SQLite backend, and the snapshot broadcast
//! channel that keeps live mirrors in sync. Every mutation through a store is
//! followed by a full per-owner snapshot on the broadcast channel, so
//! subscribers converge on the latest state without tracking deltas.

mod broadcast;
mod error;
mod memory;
mod sqlite;
mod traits;

pub use broadcast::*;
pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
