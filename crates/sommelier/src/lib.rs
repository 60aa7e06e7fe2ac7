//! AI-assisted wine entry for Cantina.
//!
//! This crate talks to the Gemini `generateContent` API to extract wine
//! details from a label photo or a free-text query, and owns the rules for
//! merging those suggestions into an in-progress draft. The two paths merge
//! differently on purpose: a label photo is evidence about the bottle in
//! hand and overwrites the draft, a text lookup is a guess and only fills
//! what the user has not typed yet.

mod client;
mod draft;
mod error;

pub use client::*;
pub use draft::*;
pub use error::*;
