//! Identity and sign-in for Cantina.
//!
//! This crate provides:
//! - The `Identity` type and the process-wide identity session
//! - OIDC authentication flow with PKCE support
//! - Authorization state storage for the login round trip
//!
//! No HTTP happens here; the server performs discovery, token exchange and
//! userinfo fetches with the URLs and parameters assembled by this crate.

mod error;
mod oidc;
mod session;
mod state_store;
mod user;

pub use error::*;
pub use oidc::*;
pub use session::*;
pub use state_store::*;
pub use user::*;

/// How long a pending login may sit between redirect and callback.
pub const DEFAULT_STATE_MAX_AGE_SECS: i64 = 600;
