//! Inventory synchronization core for Cantina.
//!
//! This crate keeps a live, identity-scoped mirror of the wine collection:
//! the store pushes full snapshots, the mirror exposes them on a watch
//! channel, and every read (listing, filtering, statistics) is served from
//! the mirror rather than the store. Mutations flow through here so the
//! owner and creation time are stamped in exactly one place.

mod filter;
mod stats;
mod sync;

pub use filter::*;
pub use stats::*;
pub use sync::*;
