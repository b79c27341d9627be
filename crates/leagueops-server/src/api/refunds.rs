use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use leagueops_core::{calculate_refund, OutcomeKind, RefundOutcome, RefundRequest};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::middleware::{ApiClient, RequestId};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Body of `POST /api/v1/refunds/quote`.
///
/// Either `league` or `season_start_date` (plus optional `off_dates`) names
/// the season. Missing fields are reported in the outcome, not as HTTP errors.
#[derive(Debug, Deserialize)]
pub(super) struct QuoteBody {
    pub league: Option<String>,
    pub season_start_date: Option<String>,
    pub off_dates: Option<String>,
    pub original_cost: Option<Decimal>,
    pub mode: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

pub(super) async fn quote_refund(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(client): Extension<ApiClient>,
    Json(body): Json<QuoteBody>,
) -> Result<Json<ApiResponse<RefundOutcome>>, ApiError> {
    let request = match body.league.as_deref() {
        Some(slug) => {
            if body.season_start_date.is_some() || body.off_dates.is_some() {
                return Err(ApiError::new(
                    req_id.0,
                    "validation_error",
                    "league cannot be combined with season_start_date or off_dates",
                ));
            }
            let Some(league) = state.leagues.find(slug) else {
                return Err(ApiError::new(
                    req_id.0,
                    "not_found",
                    format!("league '{slug}' not found"),
                ));
            };
            league.refund_request(
                body.mode.as_deref().unwrap_or_default(),
                body.original_cost,
                body.submitted_at,
            )
        }
        None => RefundRequest {
            season_start_date: body.season_start_date,
            off_dates: body.off_dates.unwrap_or_default(),
            original_cost: body.original_cost,
            mode: body.mode,
            submitted_at: body.submitted_at,
        },
    };

    let outcome = calculate_refund(&request);
    match &outcome.kind {
        OutcomeKind::InvalidInput { reason } => {
            tracing::info!(
                request_id = %req_id.0,
                client = %client.0,
                %reason,
                "refund quote not calculated"
            );
        }
        _ => {
            tracing::info!(
                request_id = %req_id.0,
                client = %client.0,
                amount = %outcome.refund_amount,
                percentage = ?outcome.percentage(),
                "refund quote calculated"
            );
        }
    }

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}
