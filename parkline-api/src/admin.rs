use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, put},
    Extension, Json, Router,
};
use parkline_core::models::{
    BookingDetails, NewParkingSpace, ParkingSpace, SpacePatch, SpaceStatus,
};
use parkline_core::RequestContext;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SpaceStatusRequest {
    pub status: SpaceStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/spaces", get(list_spaces).post(create_space))
        .route("/v1/admin/spaces/{id}", patch(update_space).delete(delete_space))
        .route("/v1/admin/spaces/{id}/status", put(set_space_status))
        .route("/v1/admin/bookings", get(active_bookings))
}

async fn list_spaces(State(state): State<AppState>) -> Result<Json<Vec<ParkingSpace>>, AppError> {
    Ok(Json(state.spaces.list_spaces().await?))
}

async fn create_space(
    State(state): State<AppState>,
    Json(req): Json<NewParkingSpace>,
) -> Result<(StatusCode, Json<ParkingSpace>), AppError> {
    if req.space_number.trim().is_empty() || req.location.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Space number and location are required".to_string(),
        ));
    }

    let id = state.spaces.create_space(&req).await?;
    info!("Space {} created as {}", req.space_number, id);

    let space = load_space(&state, id).await?;
    Ok((StatusCode::CREATED, Json(space)))
}

async fn update_space(
    State(state): State<AppState>,
    Path(space_id): Path<Uuid>,
    Json(patch): Json<SpacePatch>,
) -> Result<Json<ParkingSpace>, AppError> {
    Ok(Json(apply_patch(&state, space_id, &patch).await?))
}

/// Moves a space in or out of service. Existing bookings are left untouched.
async fn set_space_status(
    State(state): State<AppState>,
    Path(space_id): Path<Uuid>,
    Json(req): Json<SpaceStatusRequest>,
) -> Result<Json<ParkingSpace>, AppError> {
    let space = apply_patch(&state, space_id, &SpacePatch::status(req.status)).await?;
    info!("Space {} is now {}", space.space_number, space.status);
    Ok(Json(space))
}

async fn delete_space(
    State(state): State<AppState>,
    Path(space_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.spaces.delete_space(space_id).await? {
        return Err(AppError::NotFoundError(format!("Not found: space {}", space_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn active_bookings(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    Ok(Json(state.bookings.get_active_bookings(&ctx).await?))
}

async fn apply_patch(
    state: &AppState,
    space_id: Uuid,
    patch: &SpacePatch,
) -> Result<ParkingSpace, AppError> {
    if patch.is_empty() {
        return Err(AppError::ValidationError("Nothing to update".to_string()));
    }
    if !state.spaces.update_space(space_id, patch).await? {
        return Err(AppError::NotFoundError(format!("Not found: space {}", space_id)));
    }
    load_space(state, space_id).await
}

async fn load_space(state: &AppState, space_id: Uuid) -> Result<ParkingSpace, AppError> {
    state
        .spaces
        .get_space(space_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Not found: space {}", space_id)))
}
