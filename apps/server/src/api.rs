//! Wine inventory API endpoints.
//!
//! All reads are served from the live mirror, never from the store
//! directly. Mutations are fire-and-forget toward the caller: the handler
//! answers `202 Accepted` once the request is handed to the core, failures
//! are logged, and the mirror catches up through the store's subscription
//! channel. Clients watching `/api/events` see the effect when it lands.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cellar_core::{compute_statistics, filter_wines, CellarFilter};
use entities::{CategoryShare, CellarStats, NewWine, WineCategory, WinePatch, WineRecord};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Rejects core requests while the server still runs in setup mode.
pub fn ensure_configured(state: &AppState) -> ServerResult<()> {
    if state.setup_mode() {
        return Err(ServerError::SetupRequired);
    }
    Ok(())
}

/// Query parameters for the wine listing.
#[derive(Debug, Default, Deserialize)]
pub struct WineListQuery {
    /// Case-insensitive substring matched against name, producer and region.
    #[serde(default)]
    pub search: Option<String>,

    /// Category filter; absent or "all" means every category.
    #[serde(default)]
    pub category: Option<String>,
}

impl WineListQuery {
    fn into_filter(self) -> CellarFilter {
        let mut filter = CellarFilter::new();
        if let Some(search) = self.search.filter(|s| !s.trim().is_empty()) {
            filter = filter.with_search(search);
        }
        if let Some(category) = self.category.filter(|c| !c.is_empty() && c != "all") {
            filter = filter.with_category(WineCategory::parse(&category));
        }
        filter
    }
}

/// Lists the mirror, optionally filtered.
pub async fn list_wines(
    State(state): State<AppState>,
    Query(query): Query<WineListQuery>,
) -> ServerResult<Json<Vec<WineRecord>>> {
    ensure_configured(&state)?;
    let records = state.sync.records();
    Ok(Json(filter_wines(&records, &query.into_filter())))
}

/// Fetches a single wine from the mirror.
pub async fn get_wine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<WineRecord>> {
    ensure_configured(&state)?;
    state
        .sync
        .records()
        .into_iter()
        .find(|w| w.id == id)
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("wine {id}")))
}

/// Records a new wine for the signed-in identity.
pub async fn create_wine(
    State(state): State<AppState>,
    Json(wine): Json<NewWine>,
) -> ServerResult<StatusCode> {
    ensure_configured(&state)?;
    if wine.name.trim().is_empty() {
        return Err(ServerError::InvalidRequest("name must not be empty".to_string()));
    }
    if let Err(e) = state.sync.add_wine(wine).await {
        error!(error = %e, "Wine create failed");
    }
    Ok(StatusCode::ACCEPTED)
}

/// Applies a partial update to a wine.
pub async fn patch_wine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<WinePatch>,
) -> ServerResult<StatusCode> {
    ensure_configured(&state)?;
    if patch.is_empty() {
        return Err(ServerError::InvalidRequest("patch changes nothing".to_string()));
    }
    if let Err(e) = state.sync.update_wine(&id, &patch).await {
        error!(wine_id = %id, error = %e, "Wine update failed");
    }
    Ok(StatusCode::ACCEPTED)
}

/// Body of a quantity adjustment.
#[derive(Debug, Deserialize)]
pub struct QuantityAdjustment {
    /// Bottles to add (positive) or remove (negative). The resulting
    /// quantity is clamped at zero.
    pub delta: i64,
}

/// Adjusts a wine's bottle count from the listing view.
pub async fn adjust_quantity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(adjustment): Json<QuantityAdjustment>,
) -> ServerResult<StatusCode> {
    ensure_configured(&state)?;
    if let Err(e) = state.sync.adjust_quantity(&id, adjustment.delta).await {
        error!(wine_id = %id, error = %e, "Quantity adjust failed");
    }
    Ok(StatusCode::ACCEPTED)
}

/// Deletes a wine. Deleting an id that no longer exists still answers 202.
pub async fn delete_wine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    ensure_configured(&state)?;
    if let Err(e) = state.sync.delete_wine(&id).await {
        error!(wine_id = %id, error = %e, "Wine delete failed");
    }
    Ok(StatusCode::ACCEPTED)
}

/// Dashboard statistics over the current mirror.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Totals and per-category distribution.
    #[serde(flatten)]
    pub stats: CellarStats,

    /// Average price per bottle.
    pub average_price: f64,

    /// Non-empty distribution slices, for chart display.
    pub distribution_shares: Vec<CategoryShare>,
}

/// Computes aggregate statistics over the mirror.
pub async fn get_stats(State(state): State<AppState>) -> ServerResult<Json<StatsResponse>> {
    ensure_configured(&state)?;
    let stats = compute_statistics(&state.sync.records());
    Ok(Json(StatsResponse {
        average_price: stats.average_price(),
        distribution_shares: stats.distribution_shares(),
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use auth::Identity;

    use crate::test_support::{configured_state, setup_state, wait_for_mirror};

    use super::*;

    #[tokio::test]
    async fn test_setup_mode_blocks_core_routes() {
        let state = setup_state().await;

        let result = list_wines(State(state.clone()), Query(WineListQuery::default())).await;
        assert!(matches!(result, Err(ServerError::SetupRequired)));

        let result = create_wine(State(state), Json(NewWine::new("Barolo"))).await;
        assert!(matches!(result, Err(ServerError::SetupRequired)));
    }

    #[tokio::test]
    async fn test_create_then_list_round_trip() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        let status = create_wine(
            State(state.clone()),
            Json(NewWine::new("Etna Rosso").with_quantity(2)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        wait_for_mirror(&state, |records| records.len() == 1).await;

        let Json(records) = list_wines(State(state), Query(WineListQuery::default()))
            .await
            .unwrap();
        assert_eq!(records[0].name, "Etna Rosso");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        let result = create_wine(State(state), Json(NewWine::new("  "))).await;
        assert!(matches!(result, Err(ServerError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_search_and_category() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        for wine in [
            NewWine::new("Barolo").with_category(WineCategory::Red),
            NewWine::new("Gavi").with_category(WineCategory::White),
        ] {
            create_wine(State(state.clone()), Json(wine)).await.unwrap();
        }
        wait_for_mirror(&state, |records| records.len() == 2).await;

        let query = WineListQuery {
            search: Some("bar".to_string()),
            category: None,
        };
        let Json(records) = list_wines(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Barolo");

        let query = WineListQuery {
            search: None,
            category: Some("white".to_string()),
        };
        let Json(records) = list_wines(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Gavi");

        let query = WineListQuery {
            search: None,
            category: Some("all".to_string()),
        };
        let Json(records) = list_wines(State(state), Query(query)).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_get_wine_answers_404_when_absent() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        let result = get_wine(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(ServerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_quantity_adjustment_clamps_at_zero() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        create_wine(
            State(state.clone()),
            Json(NewWine::new("Last One").with_quantity(1)),
        )
        .await
        .unwrap();
        wait_for_mirror(&state, |records| records.len() == 1).await;
        let id = state.sync.records()[0].id.clone();

        for _ in 0..2 {
            adjust_quantity(
                State(state.clone()),
                Path(id.clone()),
                Json(QuantityAdjustment { delta: -1 }),
            )
            .await
            .unwrap();
            wait_for_mirror(&state, |records| records[0].quantity == 0).await;
        }

        assert_eq!(state.sync.records()[0].quantity, 0);
    }

    #[tokio::test]
    async fn test_delete_absent_wine_still_accepted() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        let status = delete_wine(State(state), Path("never-existed".to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_patch_rejects_empty_patch() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        let result = patch_wine(
            State(state),
            Path("any".to_string()),
            Json(WinePatch::new()),
        )
        .await;
        assert!(matches!(result, Err(ServerError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stats_reflect_mirror() {
        let state = configured_state().await;
        state.sync.set_identity(Some(Identity::new("user-1")));

        create_wine(
            State(state.clone()),
            Json(
                NewWine::new("Chianti")
                    .with_category(WineCategory::Red)
                    .with_quantity(2)
                    .with_price(10.0),
            ),
        )
        .await
        .unwrap();
        create_wine(
            State(state.clone()),
            Json(NewWine::new("Gavi").with_category(WineCategory::White)),
        )
        .await
        .unwrap();
        wait_for_mirror(&state, |records| records.len() == 2).await;

        let Json(response) = get_stats(State(state)).await.unwrap();
        assert_eq!(response.stats.total_bottles, 3);
        assert_eq!(response.stats.total_value, 20.0);
        assert_eq!(response.stats.distribution[&WineCategory::Red], 2);
        assert_eq!(response.stats.distribution[&WineCategory::White], 1);
        assert!((response.average_price - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(response.distribution_shares.len(), 2);
    }
}
