use axum::{extract::State, routing::get, Json, Router};
use parkline_core::models::ParkingSpace;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/spaces", get(list_spaces))
        .route("/v1/spaces/available", get(available_spaces))
}

async fn list_spaces(State(state): State<AppState>) -> Result<Json<Vec<ParkingSpace>>, AppError> {
    Ok(Json(state.spaces.list_spaces().await?))
}

/// Spaces free right now. Future windows are decided by the overlap check
/// at booking time, not by this list.
async fn available_spaces(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParkingSpace>>, AppError> {
    Ok(Json(state.bookings.get_available_spaces().await?))
}
