//! Core entity definitions for Cantina.
//!
//! This crate defines the data types shared across the Cantina workspace:
//! wine records, their categories, and the aggregate statistics derived
//! from a cellar.

mod category;
mod stats;
mod wine;

pub use category::*;
pub use stats::*;
pub use wine::*;
