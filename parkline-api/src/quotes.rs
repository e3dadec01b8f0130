use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use parkline_core::models::VehicleType;
use parkline_core::TimeWindow;
use parkline_pricing::Quote;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub vehicle_type: VehicleType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_premium: bool,
    pub discount_code: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/quotes", post(create_quote))
}

async fn create_quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    let window = TimeWindow::new(req.start_time, req.end_time)?;
    let quote = state.pricing.quote(
        req.vehicle_type.as_str(),
        &window,
        req.is_premium,
        req.discount_code.as_deref(),
    );
    Ok(Json(quote))
}
