use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct LeagueItem {
    name: String,
    slug: String,
    season_start_date: String,
    off_dates: String,
    price: Option<Decimal>,
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct BoundaryItem {
    label: &'static str,
    starts_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct LeagueScheduleData {
    league: String,
    boundaries: Vec<BoundaryItem>,
}

pub(super) async fn list_leagues(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<LeagueItem>>> {
    let data = state
        .leagues
        .leagues
        .iter()
        .map(|league| LeagueItem {
            name: league.name.clone(),
            slug: league.slug(),
            season_start_date: league.season_start_date.clone(),
            off_dates: league.off_dates.clone(),
            price: league.price,
            notes: league.notes.clone(),
        })
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn get_league_schedule(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<LeagueScheduleData>>, ApiError> {
    let Some(league) = state.leagues.find(&slug) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("league '{slug}' not found"),
        ));
    };

    let schedule = league.schedule().map_err(|e| {
        tracing::error!(league = %slug, error = %e, "league season start failed to parse");
        ApiError::new(req_id.0.clone(), "internal_error", "league schedule unavailable")
    })?;

    let boundaries = schedule
        .labeled()
        .map(|(label, starts_at)| BoundaryItem { label, starts_at })
        .collect();

    Ok(Json(ApiResponse {
        data: LeagueScheduleData {
            league: slug,
            boundaries,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
