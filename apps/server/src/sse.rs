//! Server-Sent Events stream of the live mirror.
//!
//! Clients connect once and receive the current cellar immediately, then a
//! fresh `snapshot` event every time the mirror changes. This is the push
//! half of the eventual consistency story: mutations answer 202, the effect
//! arrives here.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use tracing::{debug, info, warn};

use crate::api::ensure_configured;
use crate::error::ServerResult;
use crate::state::AppState;

/// SSE endpoint streaming cellar snapshots.
///
/// GET /api/events
pub async fn handle_events(State(state): State<AppState>) -> ServerResult<Response> {
    ensure_configured(&state)?;
    info!("SSE client connected");

    let mut mirror = state.sync.watch();

    let stream = async_stream::stream! {
        loop {
            let records = mirror.borrow_and_update().clone();
            match serde_json::to_string(&records) {
                Ok(json) => {
                    yield Ok::<_, Infallible>(Event::default().event("snapshot").data(json));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to serialize cellar snapshot");
                }
            }

            if mirror.changed().await.is_err() {
                debug!("Mirror closed, ending SSE stream");
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}
